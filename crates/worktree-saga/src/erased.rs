use async_trait::async_trait;

use crate::cloneable::CloneableAny;
use crate::step::{SagaStep, StepKind};

#[async_trait]
pub(crate) trait ErasedStep<Ctx, Err>: Send + Sync
where
    Ctx: Send + Sync,
    Err: Send,
{
    fn name(&self) -> &'static str;

    fn kind(&self) -> StepKind;

    async fn execute_erased(
        &self,
        ctx: &Ctx,
        input: Box<dyn CloneableAny>,
    ) -> Result<Box<dyn CloneableAny>, Err>;

    async fn compensate_erased(&self, ctx: &Ctx, output: Box<dyn CloneableAny>)
    -> Result<(), Err>;

    fn compensation_description(&self) -> String;
}

pub(crate) struct StepWrapper<S> {
    step: S,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

#[async_trait]
impl<S> ErasedStep<S::Context, S::Error> for StepWrapper<S>
where
    S: SagaStep,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    fn kind(&self) -> StepKind {
        self.step.kind()
    }

    async fn execute_erased(
        &self,
        ctx: &S::Context,
        input: Box<dyn CloneableAny>,
    ) -> Result<Box<dyn CloneableAny>, S::Error> {
        let typed_input = input
            .into_any()
            .downcast::<S::Input>()
            .expect("type-state builder guarantees correct input type");
        let output = self.step.execute(ctx, *typed_input).await?;
        Ok(Box::new(output))
    }

    async fn compensate_erased(
        &self,
        ctx: &S::Context,
        output: Box<dyn CloneableAny>,
    ) -> Result<(), S::Error> {
        let typed_output = output
            .into_any()
            .downcast::<S::Output>()
            .expect("saga stores the output produced by this step");
        self.step.compensate(ctx, *typed_output).await
    }

    fn compensation_description(&self) -> String {
        self.step.compensation_description()
    }
}
