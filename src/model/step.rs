use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 실행 단계 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failed,
    Warning,
    Simulated,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "SUCCESS",
            StepStatus::Failed => "FAILED",
            StepStatus::Warning => "WARNING",
            StepStatus::Simulated => "SIMULATED",
            StepStatus::Skipped => "SKIPPED",
        }
    }
}

/// 실행 단계 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    Validation,
    Backup,
    Ddl,
    Dml,
    Index,
    Constraint,
    Statistics,
    Cutover,
    Rename,
    Reorg,
    Exchange,
    Cleanup,
    Fallback,
    Ilm,
    Integrity,
    Rollback,
    Orchestration,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Validation => "VALIDATION",
            StepType::Backup => "BACKUP",
            StepType::Ddl => "DDL",
            StepType::Dml => "DML",
            StepType::Index => "INDEX",
            StepType::Constraint => "CONSTRAINT",
            StepType::Statistics => "STATISTICS",
            StepType::Cutover => "CUTOVER",
            StepType::Rename => "RENAME",
            StepType::Reorg => "REORG",
            StepType::Exchange => "EXCHANGE",
            StepType::Cleanup => "CLEANUP",
            StepType::Fallback => "FALLBACK",
            StepType::Ilm => "ILM",
            StepType::Integrity => "INTEGRITY",
            StepType::Rollback => "ROLLBACK",
            StepType::Orchestration => "ORCHESTRATION",
        }
    }
}

/// 실행 로그 단계 - 추가만 되고 수정되지 않음
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub task_id: i64,
    pub execution_id: Uuid,
    pub step_number: u32,
    pub step_name: String,
    pub step_type: StepType,
    pub statement: Option<String>,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}
