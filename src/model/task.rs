use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{validation_err, Result};
use crate::ident;
use crate::partition::interval::Granularity;

/// 작업 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Ready,
    Analyzed,
    Running,
    Completed,
    Failed,
    RolledBack,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Ready => "READY",
            TaskStatus::Analyzed => "ANALYZED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::RolledBack => "ROLLED_BACK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "READY" => Some(TaskStatus::Ready),
            "ANALYZED" => Some(TaskStatus::Analyzed),
            "RUNNING" => Some(TaskStatus::Running),
            "COMPLETED" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            "ROLLED_BACK" => Some(TaskStatus::RolledBack),
            _ => None,
        }
    }

    /// 오케스트레이터가 시작할 수 있는 상태인지 여부
    pub fn is_startable(&self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Analyzed)
    }
}

/// 마이그레이션 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationMethod {
    Ctas,
    Online,
    Exchange,
}

impl MigrationMethod {
    /// 작업에 기록된 방식 문자열 파싱 - 알 수 없는 방식은 검증 오류
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CTAS" => Ok(MigrationMethod::Ctas),
            "ONLINE" | "ONLINE_REDEF" | "REDEFINITION" => Ok(MigrationMethod::Online),
            "EXCHANGE" => Ok(MigrationMethod::Exchange),
            other => Err(validation_err(format!("알 수 없는 마이그레이션 방식: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationMethod::Ctas => "CTAS",
            MigrationMethod::Online => "ONLINE",
            MigrationMethod::Exchange => "EXCHANGE",
        }
    }

    /// 선언된 대체 순서 - 앞에서부터 시도
    pub fn fallback_chain(&self) -> &'static [MigrationMethod] {
        match self {
            MigrationMethod::Ctas => &[MigrationMethod::Ctas],
            MigrationMethod::Online => &[MigrationMethod::Online, MigrationMethod::Ctas],
            MigrationMethod::Exchange => &[MigrationMethod::Exchange, MigrationMethod::Ctas],
        }
    }
}

/// 파티션 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionType {
    Range,
    List,
    Hash,
}

impl PartitionType {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RANGE" | "INTERVAL" => Ok(PartitionType::Range),
            "LIST" | "AUTOMATIC" => Ok(PartitionType::List),
            "HASH" => Ok(PartitionType::Hash),
            other => Err(validation_err(format!("지원되지 않는 파티션 유형: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionType::Range => "RANGE",
            PartitionType::List => "LIST",
            PartitionType::Hash => "HASH",
        }
    }
}

/// 마이그레이션 작업
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationTask {
    pub id: i64,
    pub owner: String,
    pub table_name: String,
    pub partition_type: String,
    pub partition_key: String,
    #[serde(default)]
    pub interval_clause: Option<String>,
    pub method: String,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub tablespace: Option<String>,
    #[serde(default)]
    pub pctfree: Option<u8>,
    #[serde(default)]
    pub parallel_degree: Option<u32>,
    #[serde(default)]
    pub tier_template: Option<String>,
    /// 원본을 그대로 두고 결과를 _MIGR 이름으로 남김
    #[serde(default)]
    pub keep_original: bool,
    pub status: TaskStatus,
    #[serde(default)]
    pub backup_table: Option<String>,
    #[serde(default)]
    pub can_rollback: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub source_size_bytes: Option<i64>,
    #[serde(default)]
    pub target_size_bytes: Option<i64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationTask {
    /// 기본값으로 새 작업 생성
    pub fn new(
        id: i64,
        owner: impl Into<String>,
        table_name: impl Into<String>,
        partition_type: impl Into<String>,
        partition_key: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            table_name: table_name.into(),
            partition_type: partition_type.into(),
            partition_key: partition_key.into(),
            interval_clause: None,
            method: method.into(),
            compression: None,
            tablespace: None,
            pctfree: None,
            parallel_degree: None,
            tier_template: None,
            keep_original: false,
            status: TaskStatus::Ready,
            backup_table: None,
            can_rollback: false,
            error_message: None,
            source_size_bytes: None,
            target_size_bytes: None,
            duration_seconds: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// 인용된 원본 테이블 이름
    pub fn qualified_name(&self) -> String {
        ident::qualified(&self.owner, &self.table_name)
    }

    /// 로그 출력용 이름
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.owner, self.table_name)
    }

    /// 간격 절 해석
    ///
    /// 공백뿐인 절은 지정되지 않은 것으로 봅니다.
    pub fn interval(&self) -> Result<Option<Granularity>> {
        match self.interval_clause.as_deref().map(str::trim) {
            Some(clause) if !clause.is_empty() => Granularity::parse(clause)
                .map(Some)
                .ok_or_else(|| validation_err(format!("간격 절을 해석할 수 없습니다: {}", clause))),
            _ => Ok(None),
        }
    }
}
