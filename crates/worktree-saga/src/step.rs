use async_trait::async_trait;

/// Whether a step changes external state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepKind {
    /// Observes state only. Never registered for compensation.
    ReadOnly,
    /// Changes state. Registered for compensation once `execute` succeeds.
    #[default]
    Mutating,
}

/// A step in a saga that can be executed and compensated.
///
/// Each step transforms an input into an output. Mutating steps can undo
/// their effects if a later step fails; the compensation receives the output
/// the step produced, so anything discovered during `execute` (a created stash,
/// a written temp file, a previous ref value) is available to the undo.
///
/// # Type Parameters
///
/// - `Input`: Data received from the previous step (or saga entry point)
/// - `Output`: Data produced for the next step and kept for compensation
/// - `Context`: Shared dependencies (injected, not passed between steps)
/// - `Error`: The error type for step failures
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Data received from the previous step or saga entry point.
    type Input: Clone + Send + 'static;

    /// Data produced for the next step.
    type Output: Clone + Send + 'static;

    /// Shared context providing dependencies.
    type Context: Send + Sync;

    /// Error type for step failures.
    type Error: Send;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Whether this step mutates state. Defaults to [`StepKind::Mutating`].
    fn kind(&self) -> StepKind {
        StepKind::Mutating
    }

    /// Execute the step, transforming input into output.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error>;

    /// Compensate (undo) the step's effects.
    ///
    /// Called during rollback when a later step fails, with the output this
    /// step returned from `execute()`. Never called for read-only steps.
    ///
    /// The default implementation is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> Result<(), Self::Error> {
        let _ = (ctx, output);
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
