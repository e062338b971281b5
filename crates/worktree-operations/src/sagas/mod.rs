//! Git sagas composed from [`GitProvider`](crate::traits::GitProvider) calls.

/// Declares a stateless step struct generic over the git provider.
macro_rules! git_step {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<G> {
            _marker: std::marker::PhantomData<G>,
        }

        impl<G> $name<G> {
            #[must_use]
            pub fn new() -> Self {
                Self {
                    _marker: std::marker::PhantomData,
                }
            }
        }

        impl<G> Default for $name<G> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

pub(crate) use git_step;

mod apply_patch;
mod commit;
mod stage_and_commit;
mod sync;

pub use apply_patch::{
    ApplyPatchData, ApplyPatchOutput, ApplyPatchRequest, ApplyPatchSaga, ApplyPatchStep,
    WritePatchFileStep,
};
pub use commit::{
    CaptureHeadStep, CommitOutput, CommitRequest, CommitSaga, CommitSagaData, CommitStep,
    RecordStagedFilesStep, StageFilesStep,
};
pub use stage_and_commit::{StageAndCommitSaga, StagePathsStep};
pub use sync::{
    CaptureSyncStateStep, DetectOrphanedStashStep, PullStep, PushStep, RestoreStashStep,
    StashChangesStep, SyncOutput, SyncRequest, SyncSaga, SyncSagaData,
};
