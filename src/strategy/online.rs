use async_trait::async_trait;
use log::{error, info, warn};

use crate::constants::{MIGR_SUFFIX, OLD_SUFFIX, SWAP_SUFFIX};
use crate::context::ExecutionContext;
use crate::error::{execution_err, Result};
use crate::ident::{literal, suffixed};
use crate::model::{MigrationMethod, StepType};
use crate::objects;
use crate::partition::naming::rename_system_partitions;
use super::{
    build_table, drop_table_sql, refresh_statistics, rename_table_sql, Capability, MigrationJob, MigrationStrategy,
    NativePath, StrategyReport,
};

/// 엔진 온라인 재구성 기능 사용 (원본은 계속 읽기/쓰기 가능)
pub struct OnlineStrategy;

fn options_flag(path: NativePath) -> &'static str {
    match path {
        NativePath::RedefinitionByRowId => "DBMS_REDEFINITION.CONS_USE_ROWID",
        _ => "DBMS_REDEFINITION.CONS_USE_PK",
    }
}

fn can_redef_sql(owner: &str, table: &str, path: NativePath) -> String {
    format!(
        "BEGIN DBMS_REDEFINITION.CAN_REDEF_TABLE(uname => {}, tname => {}, options_flag => {}); END;",
        literal(owner),
        literal(table),
        options_flag(path)
    )
}

fn redef_call(procedure: &str, owner: &str, table: &str, interim: &str) -> String {
    format!(
        "BEGIN DBMS_REDEFINITION.{}(uname => {}, orig_table => {}, int_table => {}); END;",
        procedure,
        literal(owner),
        literal(table),
        literal(interim)
    )
}

fn start_redef_sql(owner: &str, table: &str, interim: &str, path: NativePath) -> String {
    format!(
        "BEGIN DBMS_REDEFINITION.START_REDEF_TABLE(uname => {}, orig_table => {}, int_table => {}, options_flag => {}); END;",
        literal(owner),
        literal(table),
        literal(interim),
        options_flag(path)
    )
}

fn copy_dependents_sql(owner: &str, table: &str, interim: &str) -> String {
    format!(
        "DECLARE l_errors PLS_INTEGER; BEGIN DBMS_REDEFINITION.COPY_TABLE_DEPENDENTS(uname => {}, orig_table => {}, int_table => {}, copy_indexes => DBMS_REDEFINITION.CONS_ORIG_PARAMS, copy_triggers => TRUE, copy_constraints => TRUE, copy_privileges => TRUE, ignore_errors => FALSE, num_errors => l_errors); END;",
        literal(owner),
        literal(table),
        literal(interim)
    )
}

#[async_trait]
impl MigrationStrategy for OnlineStrategy {
    fn method(&self) -> MigrationMethod {
        MigrationMethod::Online
    }

    async fn probe(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext) -> Result<Capability> {
        let task = job.task;
        if job.requires_conversion() {
            return Ok(Capability::Fallback {
                reason: "온라인 재구성은 컬럼 타입 변환을 지원하지 않습니다".to_string(),
            });
        }
        if job.source_rows < job.config.online_min_rows {
            return Ok(Capability::Fallback {
                reason: format!(
                    "행 수 {} 이 온라인 재구성 기준 {} 보다 적습니다",
                    job.source_rows, job.config.online_min_rows
                ),
            });
        }

        let path = match ctx.engine().primary_key(&task.owner, &task.table_name).await? {
            Some(pk) => {
                info!("[{}] 기본 키 {} 기반 온라인 재구성 확인", task.id, pk);
                NativePath::RedefinitionByKey
            }
            None => {
                info!("[{}] 기본 키 없음 - ROWID 기반 온라인 재구성 확인", task.id);
                NativePath::RedefinitionByRowId
            }
        };

        let sql = can_redef_sql(&task.owner, &task.table_name, path);
        match ctx.probe("CAN_REDEF_TABLE", &sql).await {
            Ok(_) => Ok(Capability::Native(path)),
            Err(e) if e.permits_fallback() => {
                warn!("[{}] 온라인 재구성 불가 - 대체 전략 사용: {}", task.id, e);
                Ok(Capability::Fallback { reason: e.to_string() })
            }
            Err(e) => Err(execution_err("CAN_REDEF_TABLE", Some(sql), e.to_string())),
        }
    }

    async fn execute(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext, path: NativePath) -> Result<StrategyReport> {
        let task = job.task;
        let owner = task.owner.as_str();
        let table = task.table_name.as_str();
        let max_len = job.config.max_identifier_length;
        let interim = suffixed(table, MIGR_SUFFIX, max_len);

        objects::cleanup_stale(ctx, owner, &interim).await?;
        let built = build_table(job, ctx, &interim).await?;
        ctx.execute("CREATE_INTERIM", StepType::Ddl, &built.sql).await?;

        if let Err(e) = redefine(job, ctx, &interim, path).await {
            error!("[{}] 온라인 재구성 실패 - 중단: {}", task.id, e);
            // 재구성이 시작되지 않았으면 실패하므로 무시
            ctx.execute_tolerant("ABORT_REDEF", StepType::Cleanup, &redef_call("ABORT_REDEF_TABLE", owner, table, &interim))
                .await;
            ctx.execute_tolerant("CLEANUP_DROP_TABLE", StepType::Cleanup, &drop_table_sql(owner, &interim))
                .await;
            return Err(e);
        }

        // 완료 후 원래 이름은 새 구조, interim 이름은 원본 구조
        let report = if task.keep_original {
            restore_original_name(job, ctx, &interim).await?;
            StrategyReport {
                method: MigrationMethod::Online,
                target_table: interim.clone(),
                retained_table: None,
                baseline_table: Some(table.to_string()),
                rollback_possible: true,
                rows_copied: None,
            }
        } else {
            let retired = suffixed(table, OLD_SUFFIX, max_len);
            let renamed = ctx
                .execute_tolerant("RENAME_INTERIM_TO_OLD", StepType::Rename, &rename_table_sql(owner, &interim, &retired))
                .await;
            let retained = if renamed { retired } else { interim.clone() };
            StrategyReport {
                method: MigrationMethod::Online,
                target_table: table.to_string(),
                retained_table: Some(retained.clone()),
                baseline_table: Some(retained),
                rollback_possible: true,
                rows_copied: None,
            }
        };

        if job.config.rename_partitions {
            rename_system_partitions(ctx, owner, &report.target_table, built.partition_type, built.interval, max_len)
                .await;
        }
        Ok(report)
    }
}

/// 원래 이름에 원본 구조를, interim 이름에 새 구조를 둠
///
/// 원본 복원이 실패하면 새 구조를 원래 이름으로 되돌리고,
/// 마지막 이름 변경이 실패하면 남은 새 구조를 삭제합니다.
/// 어느 경우든 원래 이름의 테이블은 유지됩니다.
async fn restore_original_name(job: &MigrationJob<'_>, ctx: &ExecutionContext, interim: &str) -> Result<()> {
    let task = job.task;
    let owner = task.owner.as_str();
    let table = task.table_name.as_str();
    let swap = suffixed(table, SWAP_SUFFIX, job.config.max_identifier_length);

    ctx.execute("RENAME_NEW_TO_SWAP", StepType::Rename, &rename_table_sql(owner, table, &swap))
        .await?;
    if let Err(e) = ctx
        .execute("RESTORE_ORIGINAL", StepType::Rename, &rename_table_sql(owner, interim, table))
        .await
    {
        error!("[{}] 원본 이름 복원 실패 - 새 테이블 이름 되돌림: {}", task.id, e);
        ctx.execute_tolerant("UNDO_RENAME_NEW_TO_SWAP", StepType::Cleanup, &rename_table_sql(owner, &swap, table))
            .await;
        return Err(e);
    }
    if let Err(e) = ctx
        .execute("RENAME_SWAP_TO_MIGR", StepType::Rename, &rename_table_sql(owner, &swap, interim))
        .await
    {
        error!("[{}] 새 테이블 이름 변경 실패 - {} 삭제: {}", task.id, swap, e);
        ctx.execute_tolerant("CLEANUP_DROP_TABLE", StepType::Cleanup, &drop_table_sql(owner, &swap))
            .await;
        return Err(e);
    }
    Ok(())
}

/// 재구성 시작부터 완료까지
async fn redefine(job: &MigrationJob<'_>, ctx: &ExecutionContext, interim: &str, path: NativePath) -> Result<()> {
    let owner = job.task.owner.as_str();
    let table = job.task.table_name.as_str();

    ctx.execute("START_REDEF", StepType::Reorg, &start_redef_sql(owner, table, interim, path))
        .await?;
    ctx.execute("COPY_DEPENDENTS", StepType::Reorg, &copy_dependents_sql(owner, table, interim))
        .await?;
    ctx.execute("SYNC_INTERIM", StepType::Reorg, &redef_call("SYNC_INTERIM_TABLE", owner, table, interim))
        .await?;
    refresh_statistics(ctx, owner, interim, job.parallel()).await;
    ctx.execute("FINISH_REDEF", StepType::Reorg, &redef_call("FINISH_REDEF_TABLE", owner, table, interim))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redefinition_calls() {
        assert_eq!(
            can_redef_sql("DW", "SALES", NativePath::RedefinitionByRowId),
            "BEGIN DBMS_REDEFINITION.CAN_REDEF_TABLE(uname => 'DW', tname => 'SALES', options_flag => DBMS_REDEFINITION.CONS_USE_ROWID); END;"
        );
        assert_eq!(
            redef_call("FINISH_REDEF_TABLE", "DW", "SALES", "SALES_MIGR"),
            "BEGIN DBMS_REDEFINITION.FINISH_REDEF_TABLE(uname => 'DW', orig_table => 'SALES', int_table => 'SALES_MIGR'); END;"
        );
        assert!(start_redef_sql("DW", "SALES", "SALES_MIGR", NativePath::RedefinitionByKey)
            .contains("options_flag => DBMS_REDEFINITION.CONS_USE_PK"));
    }
}
