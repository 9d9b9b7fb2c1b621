// 마이그레이션 오케스트레이터
// 작업 잠금, 상태 전이, 전략 대체 순서, 후처리(ILM, 행 수 검증, 지표)를 담당합니다.
// 실패는 작업 상태로 기록하고 호출자에게 다시 던지지 않습니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{error, info, warn};
use uuid::Uuid;

use crate::config::MigrationConfig;
use crate::constants::{BACKUP_SUFFIX, MIGR_SUFFIX};
use crate::context::ExecutionContext;
use crate::engine::Engine;
use crate::error::{validation_err, MigrationError, Result};
use crate::ident::{qualified, quote, suffixed};
use crate::ilm;
use crate::model::{
    AnalysisRecord, ExecutionStep, MigrationMethod, MigrationTask, NullStrategy, PartitionType, StepStatus, StepType,
    TaskStatus, TierTemplate,
};
use crate::objects;
use crate::store::TaskStore;
use crate::strategy::{self, drop_table_sql, rename_table_sql, Capability, MigrationJob, StrategyReport};

/// 실행 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Completed,
    Failed,
    /// 시작 조건 불충족 (작업 상태 변경 없음)
    Rejected,
    Simulated,
    RolledBack,
}

/// 작업 실행 결과
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_id: i64,
    pub execution_id: Uuid,
    pub status: OutcomeStatus,
    pub message: Option<String>,
    pub method_used: Option<MigrationMethod>,
    pub steps: Vec<ExecutionStep>,
}

impl TaskOutcome {
    fn new(ctx: &ExecutionContext, status: OutcomeStatus, message: Option<String>, method_used: Option<MigrationMethod>) -> Self {
        Self {
            task_id: ctx.task_id(),
            execution_id: ctx.execution_id(),
            status,
            message,
            method_used,
            steps: ctx.steps(),
        }
    }

    /// 실행된(또는 모의 실행된) 구문 목록
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| s.statement.as_deref())
    }
}

struct MigrationSummary {
    method: MigrationMethod,
    report: StrategyReport,
}

pub struct Orchestrator {
    engine: Arc<dyn Engine>,
    store: Arc<dyn TaskStore>,
    config: MigrationConfig,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn Engine>, store: Arc<dyn TaskStore>, config: MigrationConfig) -> Self {
        Self { engine, store, config }
    }

    /// 작업 실행 - 잠금은 항상 해제됩니다
    pub async fn run(&self, task_id: i64, simulate: bool) -> TaskOutcome {
        let ctx = ExecutionContext::new(task_id, simulate, Arc::clone(&self.engine), Arc::clone(&self.store));
        info!("[{}] 마이그레이션 시작 (실행 {}, 모의 실행 {})", task_id, ctx.execution_id(), simulate);

        if let Some(rejected) = self.acquire(&ctx).await {
            return rejected;
        }
        let outcome = self.run_locked(&ctx).await;
        self.release(task_id).await;

        info!("[{}] 마이그레이션 종료: {:?}", task_id, outcome.status);
        outcome
    }

    async fn acquire(&self, ctx: &ExecutionContext) -> Option<TaskOutcome> {
        match self.store.lock_task(ctx.task_id()).await {
            Ok(true) => None,
            Ok(false) => {
                warn!("[{}] 다른 실행이 작업을 잠그고 있어 거부", ctx.task_id());
                Some(TaskOutcome::new(
                    ctx,
                    OutcomeStatus::Rejected,
                    Some("다른 실행이 작업을 처리 중입니다".to_string()),
                    None,
                ))
            }
            Err(e) => {
                error!("[{}] 작업 잠금 실패: {}", ctx.task_id(), e);
                Some(TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(e.to_string()), None))
            }
        }
    }

    async fn release(&self, task_id: i64) {
        if let Err(e) = self.store.release_task(task_id).await {
            warn!("[{}] 작업 잠금 해제 실패: {}", task_id, e);
        }
    }

    async fn run_locked(&self, ctx: &ExecutionContext) -> TaskOutcome {
        let task_id = ctx.task_id();
        let mut task = match self.store.load_task(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                return TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(format!("작업 {} 이 없습니다", task_id)), None)
            }
            Err(e) => return TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(e.to_string()), None),
        };

        if !task.status.is_startable() {
            let message = format!("작업 상태 {} 에서는 시작할 수 없습니다", task.status.as_str());
            ctx.note("VALIDATE_STATUS", StepType::Validation, StepStatus::Failed, Some(message.clone()))
                .await;
            return TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(message), None);
        }

        let clock = Instant::now();
        if !ctx.is_simulate() {
            task.status = TaskStatus::Running;
            task.started_at = Some(Utc::now());
            task.completed_at = None;
            task.error_message = None;
            task.backup_table = None;
            task.can_rollback = false;
            if let Err(e) = self.store.update_task(&task).await {
                error!("[{}] 작업 상태 갱신 실패: {}", task_id, e);
                return TaskOutcome::new(ctx, OutcomeStatus::Failed, Some(e.to_string()), None);
            }
        }

        match self.migrate(ctx, &mut task).await {
            Ok(summary) => self.complete(ctx, &mut task, summary, clock).await,
            Err(e) => self.fail(ctx, &mut task, e, clock).await,
        }
    }

    async fn complete(
        &self,
        ctx: &ExecutionContext,
        task: &mut MigrationTask,
        summary: MigrationSummary,
        clock: Instant,
    ) -> TaskOutcome {
        let elapsed = clock.elapsed();

        if ctx.is_simulate() {
            let message = format!("모의 실행 완료 ({} 방식)", summary.method.as_str());
            return TaskOutcome::new(ctx, OutcomeStatus::Simulated, Some(message), Some(summary.method));
        }

        let saved = match (task.source_size_bytes, task.target_size_bytes) {
            (Some(source), Some(target)) => Some(source - target),
            _ => None,
        };
        let message = format!(
            "{} 방식 완료 ({}): 소요 {}, 원본 {} 바이트, 결과 {} 바이트, 절감 {} 바이트",
            summary.method.as_str(),
            summary.report.target_table,
            humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)),
            format_bytes(task.source_size_bytes),
            format_bytes(task.target_size_bytes),
            format_bytes(saved)
        );
        ctx.note("MIGRATION_COMPLETED", StepType::Orchestration, StepStatus::Success, Some(message.clone()))
            .await;

        task.status = TaskStatus::Completed;
        task.duration_seconds = Some(elapsed.as_secs_f64());
        task.completed_at = Some(Utc::now());
        task.error_message = None;
        if let Err(e) = self.store.update_task(task).await {
            error!("[{}] 완료 상태 기록 실패: {}", task.id, e);
            return TaskOutcome::new(ctx, OutcomeStatus::Failed, Some(e.to_string()), Some(summary.method));
        }

        info!("[{}] {}", task.id, message);
        TaskOutcome::new(ctx, OutcomeStatus::Completed, Some(message), Some(summary.method))
    }

    async fn fail(&self, ctx: &ExecutionContext, task: &mut MigrationTask, e: MigrationError, clock: Instant) -> TaskOutcome {
        let message = e.to_string();
        error!("[{}] 마이그레이션 실패: {}", task.id, message);
        ctx.note("MIGRATION_FAILED", StepType::Orchestration, StepStatus::Failed, Some(message.clone()))
            .await;

        if !ctx.is_simulate() {
            task.status = TaskStatus::Failed;
            task.error_message = Some(message.clone());
            task.duration_seconds = Some(clock.elapsed().as_secs_f64());
            task.completed_at = Some(Utc::now());
            if let Err(store_error) = self.store.update_task(task).await {
                error!("[{}] 실패 상태 기록 실패: {}", task.id, store_error);
            }
        }
        TaskOutcome::new(ctx, OutcomeStatus::Failed, Some(message), None)
    }

    async fn migrate(&self, ctx: &ExecutionContext, task: &mut MigrationTask) -> Result<MigrationSummary> {
        let analysis = self.store.load_analysis(task.id).await?;
        if let Some(analysis) = &analysis {
            if analysis.is_blocked() {
                return Err(validation_err(format!(
                    "차단 이슈가 있어 진행할 수 없습니다: {}",
                    analysis.blocking_issues.join(", ")
                )));
            }
            if analysis.requires_conversion && analysis.date_column.is_none() {
                return Err(validation_err("타입 변환이 필요하지만 날짜 컬럼이 지정되지 않았습니다"));
            }
        }

        let method = MigrationMethod::parse(&task.method)?;
        PartitionType::parse(&task.partition_type)?;
        let template = self.load_template(task).await?;

        if !self.engine.table_exists(&task.owner, &task.table_name).await? {
            return Err(validation_err(format!("원본 테이블이 없습니다: {}", task.display_name())));
        }
        ctx.note("VALIDATE_TASK", StepType::Validation, StepStatus::Success, None).await;

        let source_rows = self.engine.row_count(&task.owner, &task.table_name).await?;
        let source_bytes = self.engine.segment_bytes(&task.owner, &task.table_name).await?;
        task.source_size_bytes = Some(source_bytes);
        ctx.note(
            "SNAPSHOT_SOURCE",
            StepType::Validation,
            StepStatus::Success,
            Some(format!("행 {} / {} 바이트", source_rows, source_bytes)),
        )
        .await;

        let backup = if self.config.create_backup {
            Some(self.create_backup(ctx, task).await?)
        } else {
            None
        };

        if let Some(analysis) = &analysis {
            self.remediate_nulls(ctx, task, analysis).await?;
        }

        let job = MigrationJob {
            task: &*task,
            analysis: analysis.as_ref(),
            template: template.as_ref(),
            config: &self.config,
            source_rows,
            now: Utc::now().date_naive(),
        };
        let (used, report) = self.dispatch(ctx, &job, method).await?;

        task.backup_table = report.retained_table.clone().or_else(|| backup.clone());
        task.can_rollback = report.rollback_possible;

        if self.config.apply_ilm {
            if let Some(template) = &template {
                let plan = ilm::derive_plan(task, template);
                ilm::apply(ctx, &plan).await?;
            }
        }

        if !ctx.is_simulate() {
            if self.config.validate_row_counts {
                self.validate_row_counts(ctx, task, &report, backup.as_deref(), source_rows)
                    .await?;
            }
            match self.engine.segment_bytes(&task.owner, &report.target_table).await {
                Ok(bytes) => task.target_size_bytes = Some(bytes),
                Err(e) => warn!("[{}] 결과 테이블 크기 조회 실패: {}", task.id, e),
            }
        }

        Ok(MigrationSummary { method: used, report })
    }

    async fn load_template(&self, task: &MigrationTask) -> Result<Option<TierTemplate>> {
        match task.tier_template.as_deref() {
            Some(name) => match self.store.load_tier_template(name).await? {
                Some(template) => Ok(Some(template)),
                None => Err(validation_err(format!("계층 템플릿 {} 이 없습니다", name))),
            },
            None => Ok(None),
        }
    }

    /// 선언된 대체 순서대로 전략 시도
    async fn dispatch(
        &self,
        ctx: &ExecutionContext,
        job: &MigrationJob<'_>,
        requested: MigrationMethod,
    ) -> Result<(MigrationMethod, StrategyReport)> {
        for method in requested.fallback_chain() {
            let strategy = strategy::strategy_for(*method);
            match strategy.probe(job, ctx).await? {
                Capability::Native(path) => {
                    info!("[{}] {} 방식으로 실행 ({:?})", job.task.id, method.as_str(), path);
                    let report = strategy.execute(job, ctx, path).await?;
                    return Ok((*method, report));
                }
                Capability::Fallback { reason } => {
                    warn!("[{}] {} 방식 사용 불가: {}", job.task.id, method.as_str(), reason);
                    ctx.note(
                        &format!("FALLBACK_{}", method.as_str()),
                        StepType::Fallback,
                        StepStatus::Warning,
                        Some(reason),
                    )
                    .await;
                }
            }
        }
        Err(MigrationError::Capability(format!(
            "{} 방식과 대체 방식 모두 사용할 수 없습니다",
            requested.as_str()
        )))
    }

    async fn create_backup(&self, ctx: &ExecutionContext, task: &MigrationTask) -> Result<String> {
        let backup = suffixed(&task.table_name, BACKUP_SUFFIX, self.config.max_identifier_length);
        if self.engine.table_exists(&task.owner, &backup).await? {
            ctx.execute("DROP_OLD_BACKUP", StepType::Backup, &drop_table_sql(&task.owner, &backup))
                .await?;
        }
        let sql = format!(
            "CREATE TABLE {} AS SELECT * FROM {}",
            qualified(&task.owner, &backup),
            task.qualified_name()
        );
        ctx.execute("CREATE_BACKUP", StepType::Backup, &sql).await?;
        Ok(backup)
    }

    /// UPDATE 전략이면 파티션 키 NULL 값을 대체 값으로 갱신
    async fn remediate_nulls(&self, ctx: &ExecutionContext, task: &MigrationTask, analysis: &AnalysisRecord) -> Result<()> {
        if analysis.null_strategy != NullStrategy::Update {
            return Ok(());
        }
        let column = analysis.date_column.as_deref().unwrap_or(&task.partition_key);
        let sql = format!(
            "UPDATE {} SET {col} = {} WHERE {col} IS NULL",
            task.qualified_name(),
            analysis.null_replacement(),
            col = quote(column)
        );
        let rows = ctx.execute("UPDATE_NULL_KEYS", StepType::Dml, &sql).await?;
        ctx.execute("COMMIT", StepType::Dml, "COMMIT").await?;
        info!("[{}] NULL 파티션 키 {} 행 갱신", task.id, rows);
        Ok(())
    }

    async fn validate_row_counts(
        &self,
        ctx: &ExecutionContext,
        task: &MigrationTask,
        report: &StrategyReport,
        backup: Option<&str>,
        snapshot: i64,
    ) -> Result<()> {
        let target = self.engine.row_count(&task.owner, &report.target_table).await?;
        let (expected, basis) = match (report.method, backup, report.baseline_table.as_deref()) {
            (MigrationMethod::Exchange, _, _) => (snapshot, "시작 시점 스냅샷".to_string()),
            (_, Some(backup), _) => (self.engine.row_count(&task.owner, backup).await?, backup.to_string()),
            (_, None, Some(baseline)) => (self.engine.row_count(&task.owner, baseline).await?, baseline.to_string()),
            (_, None, None) => (snapshot, "시작 시점 스냅샷".to_string()),
        };

        if target != expected {
            let message = format!(
                "행 수 불일치: {} = {}, {} = {}",
                report.target_table, target, basis, expected
            );
            ctx.note("VALIDATE_ROW_COUNT", StepType::Integrity, StepStatus::Failed, Some(message.clone()))
                .await;
            return Err(MigrationError::Integrity(message));
        }

        ctx.note(
            "VALIDATE_ROW_COUNT",
            StepType::Integrity,
            StepStatus::Success,
            Some(format!("{} 행 일치 ({})", target, basis)),
        )
        .await;
        Ok(())
    }

    /// 완료/실패 작업을 마이그레이션 전 상태로 되돌림
    pub async fn rollback(&self, task_id: i64) -> TaskOutcome {
        let ctx = ExecutionContext::new(task_id, false, Arc::clone(&self.engine), Arc::clone(&self.store));
        if let Some(rejected) = self.acquire(&ctx).await {
            return rejected;
        }
        let outcome = self.rollback_locked(&ctx).await;
        self.release(task_id).await;
        outcome
    }

    async fn rollback_locked(&self, ctx: &ExecutionContext) -> TaskOutcome {
        let mut task = match self.store.load_task(ctx.task_id()).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                return TaskOutcome::new(
                    ctx,
                    OutcomeStatus::Rejected,
                    Some(format!("작업 {} 이 없습니다", ctx.task_id())),
                    None,
                )
            }
            Err(e) => return TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(e.to_string()), None),
        };

        if let Err(e) = rollback_allowed(&task) {
            ctx.note("VALIDATE_ROLLBACK", StepType::Validation, StepStatus::Failed, Some(e.to_string()))
                .await;
            return TaskOutcome::new(ctx, OutcomeStatus::Rejected, Some(e.to_string()), None);
        }

        match self.undo(ctx, &task).await {
            Ok(()) => {
                task.status = TaskStatus::RolledBack;
                task.can_rollback = false;
                task.backup_table = None;
                task.completed_at = Some(Utc::now());
                ctx.note("ROLLBACK_COMPLETED", StepType::Rollback, StepStatus::Success, None)
                    .await;
                if let Err(e) = self.store.update_task(&task).await {
                    error!("[{}] 롤백 상태 기록 실패: {}", task.id, e);
                    return TaskOutcome::new(ctx, OutcomeStatus::Failed, Some(e.to_string()), None);
                }
                info!("[{}] 롤백 완료", task.id);
                TaskOutcome::new(ctx, OutcomeStatus::RolledBack, None, None)
            }
            Err(e) => {
                // 롤백 실패는 작업 상태를 바꾸지 않음
                error!("[{}] 롤백 실패: {}", task.id, e);
                ctx.note("ROLLBACK_FAILED", StepType::Rollback, StepStatus::Failed, Some(e.to_string()))
                    .await;
                TaskOutcome::new(ctx, OutcomeStatus::Failed, Some(e.to_string()), None)
            }
        }
    }

    async fn undo(&self, ctx: &ExecutionContext, task: &MigrationTask) -> Result<()> {
        let owner = task.owner.as_str();
        let table = task.table_name.as_str();

        if task.keep_original {
            let migrated = suffixed(table, MIGR_SUFFIX, self.config.max_identifier_length);
            if self.engine.table_exists(owner, &migrated).await? {
                ctx.execute("DROP_MIGRATED", StepType::Rollback, &drop_table_sql(owner, &migrated))
                    .await?;
            }
            return Ok(());
        }

        let retained = task
            .backup_table
            .as_deref()
            .ok_or_else(|| validation_err("되돌릴 원본 테이블 정보가 없습니다"))?;
        if !self.engine.table_exists(owner, retained).await? {
            return Err(validation_err(format!("원본 테이블 {}.{} 이 없습니다", owner, retained)));
        }

        if self.engine.table_exists(owner, table).await? {
            ctx.execute("DROP_MIGRATED", StepType::Rollback, &drop_table_sql(owner, table))
                .await?;
        }
        ctx.execute("RESTORE_ORIGINAL", StepType::Rollback, &rename_table_sql(owner, retained, table))
            .await?;
        let restored = objects::restore_names(ctx, owner, table).await?;
        info!("[{}] 객체 이름 {} 개 복원", task.id, restored);
        Ok(())
    }
}

fn rollback_allowed(task: &MigrationTask) -> Result<()> {
    if !matches!(task.status, TaskStatus::Completed | TaskStatus::Failed) {
        return Err(validation_err(format!(
            "작업 상태 {} 에서는 롤백할 수 없습니다",
            task.status.as_str()
        )));
    }
    // 교환 방식과 정리까지 끝난 실패 작업은 롤백 불가로 기록됨
    if !task.can_rollback {
        return Err(validation_err("롤백 가능한 작업이 아닙니다"));
    }
    Ok(())
}

fn format_bytes(bytes: Option<i64>) -> String {
    bytes.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string())
}
