use std::time::Instant;

use crate::step::StepKind;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Step executed successfully.
    Executed,
    /// Step failed during execution.
    Failed,
    /// Step was compensated successfully.
    Compensated,
    /// Step compensation failed.
    CompensationFailed,
}

/// What happened when a completed mutating step was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The compensation ran to completion.
    Completed,
    /// The compensation returned an error; the message is kept for inspection.
    Failed(String),
}

impl RollbackOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Record of a step's execution in the saga.
#[derive(Debug)]
pub struct StepRecord {
    /// Name of the step.
    pub name: String,
    /// Whether the step was read-only or mutating.
    pub kind: StepKind,
    /// Current status.
    pub status: StepStatus,
    /// When the step started executing.
    pub started_at: Instant,
    /// When the step completed (execution or compensation).
    pub completed_at: Option<Instant>,
    /// Description of compensation (mutating steps only).
    pub compensation_description: Option<String>,
    /// Result of rolling the step back, if an unwind reached it.
    pub rollback: Option<RollbackOutcome>,
}

/// Audit log tracking all step executions in a saga.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step execution starting. Returns the record index.
    pub(crate) fn record_start(&mut self, name: &str, kind: StepKind) -> usize {
        self.records.push(StepRecord {
            name: name.to_string(),
            kind,
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
            compensation_description: None,
            rollback: None,
        });
        self.records.len() - 1
    }

    /// Mark a step as failed.
    pub(crate) fn record_failure(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = StepStatus::Failed;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Mark a step as completed successfully.
    pub(crate) fn record_success(&mut self, index: usize, compensation_description: Option<String>) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = StepStatus::Executed;
            record.completed_at = Some(Instant::now());
            record.compensation_description = compensation_description;
        }
    }

    /// Record that a step was compensated.
    pub(crate) fn record_compensated(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = StepStatus::Compensated;
            record.completed_at = Some(Instant::now());
            record.rollback = Some(RollbackOutcome::Completed);
        }
    }

    /// Record that a step's compensation failed.
    pub(crate) fn record_compensation_failed(&mut self, index: usize, message: String) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = StepStatus::CompensationFailed;
            record.completed_at = Some(Instant::now());
            record.rollback = Some(RollbackOutcome::Failed(message));
        }
    }

    /// Get all records in the audit log.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Rollback outcomes in the order the compensations ran.
    ///
    /// Compensation runs in reverse completion order, so this is the reverse
    /// of the record order restricted to steps an unwind reached.
    #[must_use]
    pub fn rollbacks(&self) -> Vec<(&str, &RollbackOutcome)> {
        self.records
            .iter()
            .rev()
            .filter_map(|r| r.rollback.as_ref().map(|o| (r.name.as_str(), o)))
            .collect()
    }

    /// True when no compensation failed (trivially true without an unwind).
    #[must_use]
    pub fn fully_compensated(&self) -> bool {
        self.records
            .iter()
            .filter_map(|r| r.rollback.as_ref())
            .all(RollbackOutcome::is_completed)
    }

    /// Get a summary of the saga execution for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
