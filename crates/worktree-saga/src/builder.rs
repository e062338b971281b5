use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crate::erased::{ErasedStep, StepWrapper};
use crate::saga::Saga;
use crate::step::SagaStep;

/// Builder state before any step has been added.
pub struct NoSteps;

/// Builder state once a chain exists; `Tail` is the output of the last step.
pub struct Chained<Tail>(PhantomData<Tail>);

/// Assembles a [`Saga`] one step at a time.
///
/// Each added step must accept the previous step's output, so a saga whose
/// steps do not line up fails to compile:
///
/// ```compile_fail
/// use async_trait::async_trait;
/// use worktree_saga::{SagaBuilder, SagaStep};
///
/// struct ReadHead;
/// #[async_trait]
/// impl SagaStep for ReadHead {
///     type Input = ();
///     type Output = String;
///     type Context = ();
///     type Error = String;
///     fn name(&self) -> &'static str { "read-head" }
///     async fn execute(&self, _: &(), _: ()) -> Result<String, String> {
///         Ok("abc123".to_string())
///     }
/// }
///
/// struct CountStashes;
/// #[async_trait]
/// impl SagaStep for CountStashes {
///     type Input = usize;
///     type Output = usize;
///     type Context = ();
///     type Error = String;
///     fn name(&self) -> &'static str { "count-stashes" }
///     async fn execute(&self, _: &(), n: usize) -> Result<usize, String> {
///         Ok(n)
///     }
/// }
///
/// let saga = SagaBuilder::new()
///     .first_step(ReadHead)
///     .then(CountStashes)
///     .build();
/// ```
///
/// `build` only exists once a step has been added:
///
/// ```compile_fail
/// use worktree_saga::SagaBuilder;
///
/// let saga = SagaBuilder::<(), (), (), String, _>::new().build();
/// ```
pub struct SagaBuilder<In, Out, Ctx, Err, State> {
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    _state: PhantomData<fn(In, State) -> Out>,
}

impl<In, Out, Ctx, Err, State> SagaBuilder<In, Out, Ctx, Err, State>
where
    Ctx: Send + Sync,
    Err: Send,
{
    fn push<S, NextIn, NextOut, NextState>(
        mut self,
        step: S,
    ) -> SagaBuilder<NextIn, NextOut, Ctx, Err, NextState>
    where
        S: SagaStep<Context = Ctx, Error = Err> + 'static,
    {
        self.steps.push(Box::new(StepWrapper::new(step)));
        SagaBuilder {
            steps: self.steps,
            _state: PhantomData,
        }
    }
}

impl<Ctx, Err> SagaBuilder<(), (), Ctx, Err, NoSteps>
where
    Ctx: Send + Sync,
    Err: Send,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Starts the chain. The saga takes this step's input.
    #[must_use]
    pub fn first_step<S>(
        self,
        step: S,
    ) -> SagaBuilder<S::Input, S::Output, Ctx, Err, Chained<S::Output>>
    where
        S: SagaStep<Context = Ctx, Error = Err> + 'static,
    {
        self.push(step)
    }
}

impl<Ctx, Err> Default for SagaBuilder<(), (), Ctx, Err, NoSteps>
where
    Ctx: Send + Sync,
    Err: Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Tail, Ctx, Err> SagaBuilder<In, Tail, Ctx, Err, Chained<Tail>>
where
    Ctx: Send + Sync,
    Err: Send,
{
    /// Appends a step that consumes the current tail output.
    #[must_use]
    pub fn then<S>(self, step: S) -> SagaBuilder<In, S::Output, Ctx, Err, Chained<S::Output>>
    where
        S: SagaStep<Input = Tail, Context = Ctx, Error = Err> + 'static,
    {
        self.push(step)
    }

    #[must_use]
    pub fn build(self) -> Saga<In, Tail, Ctx, Err>
    where
        In: Clone + Send + 'static,
        Tail: Send + 'static,
        Err: Debug + Display,
    {
        Saga::from_steps(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct GitFailure(String);

    struct ReadHead;

    #[async_trait]
    impl SagaStep for ReadHead {
        type Input = ();
        type Output = String;
        type Context = ();
        type Error = GitFailure;

        fn name(&self) -> &'static str {
            "read-head"
        }

        async fn execute(&self, _ctx: &(), _input: ()) -> Result<String, GitFailure> {
            Ok("abc123".to_string())
        }
    }

    struct ShortenSha;

    #[async_trait]
    impl SagaStep for ShortenSha {
        type Input = String;
        type Output = String;
        type Context = ();
        type Error = GitFailure;

        fn name(&self) -> &'static str {
            "shorten-sha"
        }

        async fn execute(&self, _ctx: &(), sha: String) -> Result<String, GitFailure> {
            Ok(sha.chars().take(3).collect())
        }
    }

    #[test]
    fn single_step_saga_keeps_its_name() {
        let saga: Saga<(), String, (), GitFailure> =
            SagaBuilder::new().first_step(ReadHead).build();

        assert_eq!(saga.step_names(), vec!["read-head"]);
    }

    #[tokio::test]
    async fn chained_steps_pass_outputs_along() {
        let saga: Saga<(), String, (), GitFailure> = SagaBuilder::new()
            .first_step(ReadHead)
            .then(ShortenSha)
            .build();

        assert_eq!(saga.step_names(), vec!["read-head", "shorten-sha"]);
        assert_eq!(saga.execute(&(), ()).await.ok().as_deref(), Some("abc"));
    }
}
