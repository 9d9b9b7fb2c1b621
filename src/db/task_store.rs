// PostgreSQL 제어 테이블 기반 작업 저장소
// 작업 잠금은 세션 수준 advisory lock으로, 잠금을 잡은 연결을 해제 시까지 보관합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::Object;
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio_postgres::Row;

use super::pool::DatabasePool;
use crate::constants::control;
use crate::error::{store_err, Result};
use crate::ilm::IlmPlan;
use crate::model::{AnalysisRecord, ExecutionStep, MigrationTask, NullStrategy, TaskStatus, TierTemplate};
use crate::store::TaskStore;

/// 제어 데이터베이스 작업 저장소
pub struct PgTaskStore {
    pool: Arc<DatabasePool>,
    /// 작업 ID별 잠금 보유 연결
    locks: Mutex<HashMap<i64, Object>>,
}

fn db_err(context: &str, e: tokio_postgres::Error) -> crate::error::MigrationError {
    store_err(format!("{}: {}", context, e))
}

impl PgTaskStore {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self {
            pool,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 제어 스키마와 테이블 생성 (이미 있으면 유지)
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.pool.get_client().await?;
        client
            .batch_execute(control::CREATE_SCHEMA)
            .await
            .map_err(|e| db_err("스키마 생성 실패", e))?;
        for sql in control::CREATE_TABLES.iter().chain(control::CREATE_INDICES.iter()) {
            client
                .batch_execute(sql)
                .await
                .map_err(|e| db_err("제어 테이블 생성 실패", e))?;
        }
        info!("제어 스키마 준비 완료 (테이블 {}개)", control::CREATE_TABLES.len());
        Ok(())
    }
}

fn task_from_row(row: &Row) -> std::result::Result<MigrationTask, tokio_postgres::Error> {
    let status: String = row.try_get("status")?;
    let pctfree: Option<i16> = row.try_get("pctfree")?;
    let parallel: Option<i32> = row.try_get("parallel_degree")?;

    let mut task = MigrationTask::new(
        row.try_get("id")?,
        row.try_get::<_, String>("owner")?,
        row.try_get::<_, String>("table_name")?,
        row.try_get::<_, String>("partition_type")?,
        row.try_get::<_, String>("partition_key")?,
        row.try_get::<_, String>("method")?,
    );
    task.interval_clause = row.try_get("interval_clause")?;
    task.compression = row.try_get("compression")?;
    task.tablespace = row.try_get("tablespace")?;
    task.pctfree = pctfree.and_then(|p| u8::try_from(p).ok());
    task.parallel_degree = parallel.and_then(|p| u32::try_from(p).ok());
    task.tier_template = row.try_get("tier_template")?;
    task.keep_original = row.try_get("keep_original")?;
    let id = task.id;
    task.status = TaskStatus::parse(&status).unwrap_or_else(|| {
        warn!("작업 {}: 알 수 없는 상태 {} - FAILED로 취급", id, status);
        TaskStatus::Failed
    });
    task.backup_table = row.try_get("backup_table")?;
    task.can_rollback = row.try_get("can_rollback")?;
    task.error_message = row.try_get("error_message")?;
    task.source_size_bytes = row.try_get("source_size_bytes")?;
    task.target_size_bytes = row.try_get("target_size_bytes")?;
    task.duration_seconds = row.try_get("duration_seconds")?;
    task.started_at = row.try_get("started_at")?;
    task.completed_at = row.try_get("completed_at")?;
    Ok(task)
}

fn analysis_from_row(row: &Row) -> std::result::Result<AnalysisRecord, tokio_postgres::Error> {
    let null_strategy: String = row.try_get("null_strategy")?;
    Ok(AnalysisRecord {
        task_id: row.try_get("task_id")?,
        recommended_strategy: row.try_get("recommended_strategy")?,
        date_column: row.try_get("date_column")?,
        date_column_type: row.try_get("date_column_type")?,
        min_date: row.try_get("min_date")?,
        max_date: row.try_get("max_date")?,
        requires_conversion: row.try_get("requires_conversion")?,
        conversion_format: row.try_get("conversion_format")?,
        null_strategy: if null_strategy.eq_ignore_ascii_case("UPDATE") {
            NullStrategy::Update
        } else {
            NullStrategy::Allow
        },
        null_replacement: row.try_get("null_replacement")?,
        null_count: row.try_get("null_count")?,
        row_count: row.try_get("row_count")?,
        blocking_issues: row.try_get("blocking_issues")?,
    })
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn lock_task(&self, task_id: i64) -> Result<bool> {
        let mut locks = self.locks.lock().await;
        if locks.contains_key(&task_id) {
            debug!("작업 {} 잠금을 이 프로세스가 이미 보유 중", task_id);
            return Ok(false);
        }

        let client = self.pool.get_client().await?;
        let row = client
            .query_one(control::TRY_LOCK, &[&task_id])
            .await
            .map_err(|e| db_err("작업 잠금 실패", e))?;
        let acquired: bool = row.try_get(0).map_err(|e| db_err("작업 잠금 결과 해석 실패", e))?;
        if acquired {
            locks.insert(task_id, client);
        }
        Ok(acquired)
    }

    async fn release_task(&self, task_id: i64) -> Result<()> {
        let client = self.locks.lock().await.remove(&task_id);
        match client {
            Some(client) => {
                client
                    .query_one(control::UNLOCK, &[&task_id])
                    .await
                    .map_err(|e| db_err("작업 잠금 해제 실패", e))?;
                debug!("작업 {} 잠금 해제", task_id);
            }
            None => warn!("작업 {}: 보유하지 않은 잠금 해제 요청", task_id),
        }
        Ok(())
    }

    async fn load_task(&self, task_id: i64) -> Result<Option<MigrationTask>> {
        let client = self.pool.get_client().await?;
        let row = client
            .query_opt(control::SELECT_TASK, &[&task_id])
            .await
            .map_err(|e| db_err("작업 조회 실패", e))?;
        row.as_ref()
            .map(task_from_row)
            .transpose()
            .map_err(|e| db_err("작업 레코드 해석 실패", e))
    }

    async fn load_analysis(&self, task_id: i64) -> Result<Option<AnalysisRecord>> {
        let client = self.pool.get_client().await?;
        let row = client
            .query_opt(control::SELECT_ANALYSIS, &[&task_id])
            .await
            .map_err(|e| db_err("분석 레코드 조회 실패", e))?;
        row.as_ref()
            .map(analysis_from_row)
            .transpose()
            .map_err(|e| db_err("분석 레코드 해석 실패", e))
    }

    async fn load_tier_template(&self, name: &str) -> Result<Option<TierTemplate>> {
        let client = self.pool.get_client().await?;
        let row = client
            .query_opt(control::SELECT_TIER_TEMPLATE, &[&name])
            .await
            .map_err(|e| db_err("계층 템플릿 조회 실패", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let document: String = row.try_get(0).map_err(|e| db_err("계층 템플릿 해석 실패", e))?;
        TierTemplate::parse(name, &document).map(Some)
    }

    async fn update_task(&self, task: &MigrationTask) -> Result<()> {
        let client = self.pool.get_client().await?;
        let updated = client
            .execute(
                control::UPDATE_TASK,
                &[
                    &task.id,
                    &task.status.as_str(),
                    &task.backup_table,
                    &task.can_rollback,
                    &task.error_message,
                    &task.source_size_bytes,
                    &task.target_size_bytes,
                    &task.duration_seconds,
                    &task.started_at,
                    &task.completed_at,
                ],
            )
            .await
            .map_err(|e| db_err("작업 갱신 실패", e))?;
        if updated == 0 {
            return Err(store_err(format!("갱신할 작업이 없습니다: {}", task.id)));
        }
        Ok(())
    }

    async fn append_step(&self, step: &ExecutionStep) -> Result<()> {
        let client = self.pool.get_client().await?;
        let step_number = i32::try_from(step.step_number).unwrap_or(i32::MAX);
        client
            .execute(
                control::INSERT_STEP,
                &[
                    &step.task_id,
                    &step.execution_id,
                    &step_number,
                    &step.step_name,
                    &step.step_type.as_str(),
                    &step.statement,
                    &step.status.as_str(),
                    &step.started_at,
                    &step.finished_at,
                    &step.error,
                ],
            )
            .await
            .map_err(|e| db_err("실행 로그 기록 실패", e))?;
        Ok(())
    }

    async fn save_ilm_policies(&self, plan: &IlmPlan) -> Result<usize> {
        let mut client = self.pool.get_client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| db_err("ILM 트랜잭션 시작 실패", e))?;

        let days = |d: u32| i32::try_from(d).unwrap_or(i32::MAX);
        let profile = &plan.profile;
        tx.execute(
            control::UPSERT_ILM_PROFILE,
            &[
                &profile.name,
                &plan.task_id,
                &days(profile.hot_days),
                &days(profile.warm_days),
                &days(profile.cold_days),
            ],
        )
        .await
        .map_err(|e| db_err("ILM 프로파일 저장 실패", e))?;

        let mut saved = 0;
        for policy in &plan.policies {
            let after = policy.after.to_string();
            let compression = policy.compression.map(|c| c.clause());
            saved += tx
                .execute(
                    control::UPSERT_ILM_POLICY,
                    &[
                        &policy.policy_name,
                        &plan.task_id,
                        &profile.name,
                        &policy.owner,
                        &policy.table_name,
                        &policy.from_tier.as_str(),
                        &policy.to_tier.as_str(),
                        &policy.action.as_str(),
                        &after,
                        &policy.tablespace,
                        &compression,
                    ],
                )
                .await
                .map_err(|e| db_err("ILM 정책 저장 실패", e))? as usize;
        }

        tx.commit().await.map_err(|e| db_err("ILM 트랜잭션 커밋 실패", e))?;
        debug!("작업 {}: ILM 정책 {}개 저장", plan.task_id, saved);
        Ok(saved)
    }
}
