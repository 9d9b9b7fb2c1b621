// 마이그레이션 전략
// 각 전략은 먼저 기능 확인(probe)으로 직접 수행 가능 여부를 돌려주고,
// 가능하면 execute로 실제 이동을 수행합니다. 대체 순서는 오케스트레이터가 결정합니다.

pub mod ctas;
pub mod exchange;
pub mod online;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::MigrationConfig;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::ident::{literal, qualified, quote};
use crate::model::{AnalysisRecord, MigrationMethod, MigrationTask, StepType, TierTemplate};
use crate::partition::{build_create_table, BuildRequest, BuiltTable, Granularity};

pub use ctas::CtasStrategy;
pub use exchange::ExchangeStrategy;
pub use online::OnlineStrategy;

/// 전략 실행 입력
pub struct MigrationJob<'a> {
    pub task: &'a MigrationTask,
    pub analysis: Option<&'a AnalysisRecord>,
    pub template: Option<&'a TierTemplate>,
    pub config: &'a MigrationConfig,
    /// 시작 시점 원본 행 수
    pub source_rows: i64,
    pub now: NaiveDate,
}

impl MigrationJob<'_> {
    pub fn parallel(&self) -> Option<u32> {
        self.task.parallel_degree.or(self.config.parallel_degree)
    }

    pub fn requires_conversion(&self) -> bool {
        self.analysis.is_some_and(|a| a.requires_conversion)
    }
}

/// 직접 수행 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativePath {
    Copy,
    /// 기본 키 기반 온라인 재구성
    RedefinitionByKey,
    /// ROWID 기반 온라인 재구성
    RedefinitionByRowId,
    Exchange {
        period_start: NaiveDate,
        granularity: Granularity,
    },
}

/// 기능 확인 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Native(NativePath),
    Fallback { reason: String },
}

/// 전략 수행 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyReport {
    pub method: MigrationMethod,
    /// 마이그레이션된 데이터가 있는 테이블
    pub target_table: String,
    /// 남겨진 원본 구조 테이블 (_OLD, _EMPTY)
    pub retained_table: Option<String>,
    /// 행 수 비교 기준 테이블 (없으면 시작 시점 스냅샷)
    pub baseline_table: Option<String>,
    pub rollback_possible: bool,
    pub rows_copied: Option<u64>,
}

#[async_trait]
pub trait MigrationStrategy: Send + Sync {
    fn method(&self) -> MigrationMethod;

    /// 직접 수행 가능 여부 확인 - 변경 구문은 실행하지 않음
    async fn probe(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext) -> Result<Capability>;

    /// 실패 시 정리/중단 후 오류를 그대로 반환
    async fn execute(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext, path: NativePath) -> Result<StrategyReport>;
}

pub fn strategy_for(method: MigrationMethod) -> Box<dyn MigrationStrategy> {
    match method {
        MigrationMethod::Ctas => Box::new(CtasStrategy),
        MigrationMethod::Online => Box::new(OnlineStrategy),
        MigrationMethod::Exchange => Box::new(ExchangeStrategy),
    }
}

/// 원본 컬럼 정보로 대상 테이블 DDL 생성
pub(crate) async fn build_table(job: &MigrationJob<'_>, ctx: &ExecutionContext, target_table: &str) -> Result<BuiltTable> {
    let task = job.task;
    let columns = ctx.engine().columns(&task.owner, &task.table_name).await?;
    let request = BuildRequest {
        task,
        analysis: job.analysis,
        template: job.template,
        columns: &columns,
        target_table,
        now: job.now,
        buffer_periods: job.config.uniform_buffer_periods,
        hash_partitions: job.config.hash_partitions,
        parallel: job.parallel(),
        max_identifier_length: job.config.max_identifier_length,
    };
    build_create_table(&request)
}

pub(crate) fn rename_table_sql(owner: &str, from: &str, to: &str) -> String {
    format!("ALTER TABLE {} RENAME TO {}", qualified(owner, from), quote(to))
}

pub(crate) fn drop_table_sql(owner: &str, table: &str) -> String {
    format!("DROP TABLE {} PURGE", qualified(owner, table))
}

pub(crate) fn gather_stats_sql(owner: &str, table: &str, parallel: Option<u32>) -> String {
    let degree = parallel
        .map(|d| format!(", degree => {}", d))
        .unwrap_or_default();
    format!(
        "BEGIN DBMS_STATS.GATHER_TABLE_STATS(ownname => {}, tabname => {}, cascade => TRUE{}); END;",
        literal(owner),
        literal(table),
        degree
    )
}

/// 통계 갱신 - 실패는 경고
pub(crate) async fn refresh_statistics(ctx: &ExecutionContext, owner: &str, table: &str, parallel: Option<u32>) {
    let sql = gather_stats_sql(owner, table, parallel);
    ctx.execute_tolerant("GATHER_STATS", StepType::Statistics, &sql).await;
}
