use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use tracing::{debug, error, warn};

use crate::audit::SagaAuditLog;
use crate::cloneable::CloneableAny;
use crate::erased::ErasedStep;
use crate::error::{CompensationError, SagaError, SagaResult};
use crate::step::StepKind;

/// A compiled saga ready for execution.
///
/// Sagas execute a sequence of steps, where each step's output becomes the
/// next step's input. Steps run strictly one after another. If any step
/// fails, previously completed mutating steps are compensated in reverse
/// order (LIFO). Read-only steps are never compensated.
pub struct Saga<Input, Output, Ctx, Err> {
    name: &'static str,
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    _phantom: PhantomData<fn(Input) -> Output>,
}

struct Completed {
    index: usize,
    record: usize,
    output: Box<dyn CloneableAny>,
}

impl<Input, Output, Ctx, Err> Saga<Input, Output, Ctx, Err>
where
    Input: Clone + Send + 'static,
    Output: Send + 'static,
    Ctx: Send + Sync,
    Err: Debug + Display + Send,
{
    pub(crate) fn from_steps(steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>) -> Self {
        Self {
            name: "saga",
            steps,
            _phantom: PhantomData,
        }
    }

    /// Set the name used in log events.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Names of the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Execute the saga, returning the final output on success.
    ///
    /// On failure, compensates all previously completed mutating steps in
    /// reverse order.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step fails and all compensations succeed.
    /// Returns `SagaError::CompensationFailed` if a step fails and some compensations also fail.
    pub async fn execute(&self, ctx: &Ctx, input: Input) -> SagaResult<Output, Err> {
        let (result, _audit_log) = self.execute_internal(ctx, input).await;
        result
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log tracks all step executions and compensations.
    pub async fn execute_with_audit(
        &self,
        ctx: &Ctx,
        input: Input,
    ) -> (SagaResult<Output, Err>, SagaAuditLog) {
        self.execute_internal(ctx, input).await
    }

    async fn execute_internal(
        &self,
        ctx: &Ctx,
        input: Input,
    ) -> (SagaResult<Output, Err>, SagaAuditLog) {
        let mut audit_log = SagaAuditLog::new();
        let mut compensation_stack: Vec<Completed> = Vec::new();

        let mut current_input: Box<dyn CloneableAny> = Box::new(input);

        for (index, step) in self.steps.iter().enumerate() {
            let kind = step.kind();
            let record = audit_log.record_start(step.name(), kind);
            debug!(saga = self.name, step = step.name(), ?kind, "running step");

            match step.execute_erased(ctx, current_input).await {
                Ok(output) => {
                    match kind {
                        StepKind::Mutating => {
                            audit_log.record_success(record, Some(step.compensation_description()));
                            compensation_stack.push(Completed {
                                index,
                                record,
                                output: output.clone_box(),
                            });
                        }
                        StepKind::ReadOnly => audit_log.record_success(record, None),
                    }

                    if index == self.steps.len() - 1 {
                        let typed_output = output
                            .into_any()
                            .downcast::<Output>()
                            .expect("type-state builder guarantees final output type");
                        debug!(saga = self.name, "saga completed");
                        return (Ok(*typed_output), audit_log);
                    }

                    current_input = output;
                }
                Err(error) => {
                    audit_log.record_failure(record);
                    warn!(
                        saga = self.name,
                        step = step.name(),
                        %error,
                        pending = compensation_stack.len(),
                        "step failed, unwinding completed steps"
                    );
                    let saga_error = self
                        .compensate(ctx, &mut audit_log, compensation_stack, step.name(), error)
                        .await;
                    return (Err(saga_error), audit_log);
                }
            }
        }

        unreachable!("saga must have at least one step")
    }

    async fn compensate(
        &self,
        ctx: &Ctx,
        audit_log: &mut SagaAuditLog,
        mut compensation_stack: Vec<Completed>,
        failed_step: &str,
        step_error: Err,
    ) -> SagaError<Err> {
        let mut compensation_errors = Vec::new();

        while let Some(completed) = compensation_stack.pop() {
            let step = &self.steps[completed.index];
            let step_name = step.name();
            let description = step.compensation_description();

            match step.compensate_erased(ctx, completed.output).await {
                Ok(()) => {
                    debug!(saga = self.name, step = step_name, "compensated");
                    audit_log.record_compensated(completed.record);
                }
                Err(error) => {
                    error!(
                        saga = self.name,
                        step = step_name,
                        compensation = %description,
                        %error,
                        "compensation failed, continuing unwind"
                    );
                    audit_log.record_compensation_failed(completed.record, error.to_string());
                    compensation_errors.push(CompensationError {
                        step: step_name.to_string(),
                        description,
                        error,
                    });
                }
            }
        }

        if compensation_errors.is_empty() {
            SagaError::StepFailed {
                step: failed_step.to_string(),
                source: step_error,
            }
        } else {
            SagaError::CompensationFailed {
                failed_step: failed_step.to_string(),
                step_error,
                compensation_errors,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::audit::{RollbackOutcome, StepStatus};
    use crate::builder::SagaBuilder;
    use crate::step::SagaStep;

    struct TestContext {
        compensation_log: Mutex<Vec<String>>,
    }

    impl TestContext {
        fn new() -> Self {
            Self {
                compensation_log: Mutex::new(Vec::new()),
            }
        }

        fn log(&self) -> Vec<String> {
            self.compensation_log.lock().expect("lock poisoned").clone()
        }

        fn push(&self, entry: String) {
            self.compensation_log.lock().expect("lock poisoned").push(entry);
        }
    }

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    struct AddStep {
        name: &'static str,
        value: i32,
    }

    #[async_trait]
    impl SagaStep for AddStep {
        type Input = i32;
        type Output = i32;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input + self.value)
        }

        async fn compensate(
            &self,
            ctx: &Self::Context,
            output: Self::Output,
        ) -> Result<(), Self::Error> {
            ctx.push(format!("compensate {} with output {}", self.name, output));
            Ok(())
        }
    }

    struct FailingStep {
        error_msg: String,
    }

    #[async_trait]
    impl SagaStep for FailingStep {
        type Input = i32;
        type Output = i32;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "failing"
        }

        async fn execute(
            &self,
            _ctx: &Self::Context,
            _input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Err(TestError(self.error_msg.clone()))
        }
    }

    struct FailingCompensationStep {
        name: &'static str,
    }

    #[async_trait]
    impl SagaStep for FailingCompensationStep {
        type Input = i32;
        type Output = i32;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input)
        }

        async fn compensate(
            &self,
            _ctx: &Self::Context,
            _output: Self::Output,
        ) -> Result<(), Self::Error> {
            Err(TestError(format!("compensation failed for {}", self.name)))
        }
    }

    struct ObserveStep;

    #[async_trait]
    impl SagaStep for ObserveStep {
        type Input = i32;
        type Output = i32;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "observe"
        }

        fn kind(&self) -> StepKind {
            StepKind::ReadOnly
        }

        async fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input)
        }

        async fn compensate(
            &self,
            ctx: &Self::Context,
            _output: Self::Output,
        ) -> Result<(), Self::Error> {
            ctx.push("read-only step compensated".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn multi_step_saga_flows_data_through_steps() -> anyhow::Result<()> {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(AddStep {
                name: "add_10",
                value: 10,
            })
            .then(ObserveStep)
            .then(AddStep {
                name: "add_5",
                value: 5,
            })
            .build();

        let result = saga.execute(&ctx, 5).await?;

        assert_eq!(result, 20);
        assert!(ctx.log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn compensation_happens_in_lifo_order_with_stored_outputs() {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(AddStep {
                name: "add_10",
                value: 10,
            })
            .then(AddStep {
                name: "add_3",
                value: 3,
            })
            .then(FailingStep {
                error_msg: "boom".to_string(),
            })
            .build();

        let result = saga.execute(&ctx, 5).await;

        assert!(result.is_err());
        assert_eq!(
            ctx.log(),
            vec![
                "compensate add_3 with output 18".to_string(),
                "compensate add_10 with output 15".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn read_only_step_is_never_compensated() {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(ObserveStep)
            .then(FailingStep {
                error_msg: "boom".to_string(),
            })
            .build();

        let (result, audit) = saga.execute_with_audit(&ctx, 42).await;

        assert!(result.is_err());
        assert!(ctx.log().is_empty());
        assert_eq!(audit.records()[0].kind, StepKind::ReadOnly);
        assert_eq!(audit.records()[0].status, StepStatus::Executed);
        assert!(audit.records()[0].rollback.is_none());
    }

    #[tokio::test]
    async fn first_step_failure_requires_no_compensation() {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(FailingStep {
                error_msg: "immediate failure".to_string(),
            })
            .build();

        let err = saga
            .execute(&ctx, 42)
            .await
            .expect_err("should be an error");
        assert!(matches!(err, SagaError::StepFailed { ref step, .. } if step == "failing"));
        assert_eq!(err.step_error(), &TestError("immediate failure".to_string()));
        assert!(ctx.log().is_empty());
    }

    #[tokio::test]
    async fn compensation_failure_keeps_original_error_and_continues_unwind() {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(AddStep {
                name: "add_10",
                value: 10,
            })
            .then(FailingCompensationStep {
                name: "will_fail_comp",
            })
            .then(FailingStep {
                error_msg: "trigger compensation".to_string(),
            })
            .build();

        let err = saga.execute(&ctx, 5).await.expect_err("should be an error");
        match err {
            SagaError::CompensationFailed {
                failed_step,
                step_error,
                compensation_errors,
            } => {
                assert_eq!(failed_step, "failing");
                assert_eq!(step_error, TestError("trigger compensation".to_string()));
                assert_eq!(compensation_errors.len(), 1);
                assert_eq!(compensation_errors[0].step, "will_fail_comp");
            }
            SagaError::StepFailed { .. } => {
                panic!("expected CompensationFailed error");
            }
        }

        assert_eq!(ctx.log(), vec!["compensate add_10 with output 15".to_string()]);
    }

    #[tokio::test]
    async fn audit_log_records_rollback_outcomes() {
        let ctx = TestContext::new();

        let saga = SagaBuilder::new()
            .first_step(AddStep {
                name: "add_10",
                value: 10,
            })
            .then(FailingCompensationStep {
                name: "will_fail_comp",
            })
            .then(FailingStep {
                error_msg: "trigger compensation".to_string(),
            })
            .build()
            .named("audit_test");

        let (result, audit_log) = saga.execute_with_audit(&ctx, 5).await;

        assert!(result.is_err());

        let records = audit_log.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, StepStatus::Compensated);
        assert_eq!(records[0].rollback, Some(RollbackOutcome::Completed));
        assert_eq!(records[1].status, StepStatus::CompensationFailed);
        assert_eq!(
            records[1].rollback,
            Some(RollbackOutcome::Failed(
                "compensation failed for will_fail_comp".to_string()
            ))
        );
        assert_eq!(records[2].status, StepStatus::Failed);
        assert!(!audit_log.fully_compensated());
    }

    #[test]
    fn step_names_follow_declaration_order() {
        let saga = SagaBuilder::new()
            .first_step(ObserveStep)
            .then(AddStep {
                name: "add_1",
                value: 1,
            })
            .build()
            .named("ordering");

        assert_eq!(saga.name(), "ordering");
        assert_eq!(saga.step_names(), vec!["observe", "add_1"]);
    }
}
