use async_trait::async_trait;
use log::{error, info, warn};

use crate::constants::{MIGR_SUFFIX, OLD_SUFFIX};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::ident::suffixed;
use crate::model::{MigrationMethod, StepType};
use crate::objects::{self, ObjectRename, RebuildRequest};
use crate::partition::naming::rename_system_partitions;
use crate::partition::BuiltTable;
use super::{
    build_table, drop_table_sql, refresh_statistics, rename_table_sql, Capability, MigrationJob, MigrationStrategy,
    NativePath, StrategyReport,
};

/// 새 파티션 테이블 생성 후 전체 복사
pub struct CtasStrategy;

#[async_trait]
impl MigrationStrategy for CtasStrategy {
    fn method(&self) -> MigrationMethod {
        MigrationMethod::Ctas
    }

    async fn probe(&self, _job: &MigrationJob<'_>, _ctx: &ExecutionContext) -> Result<Capability> {
        Ok(Capability::Native(NativePath::Copy))
    }

    async fn execute(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext, _path: NativePath) -> Result<StrategyReport> {
        let task = job.task;
        let owner = task.owner.as_str();
        let table = task.table_name.as_str();
        let max_len = job.config.max_identifier_length;
        let target = suffixed(table, MIGR_SUFFIX, max_len);

        objects::cleanup_stale(ctx, owner, &target).await?;
        let built = build_table(job, ctx, &target).await?;
        ctx.execute("CREATE_TABLE", StepType::Ddl, &built.sql).await?;

        let (rows, renames) = match populate(job, ctx, &built, &target).await {
            Ok(result) => result,
            Err(e) => {
                error!("[{}] CTAS 실패 - 새 테이블 정리: {}", task.id, e);
                drop_new_table(ctx, owner, &target).await;
                return Err(e);
            }
        };

        if task.keep_original {
            info!("[{}] 원본 유지 모드 - 결과 테이블 {}.{}", task.id, owner, target);
            if job.config.rename_partitions {
                rename_system_partitions(ctx, owner, &target, built.partition_type, built.interval, max_len).await;
            }
            return Ok(StrategyReport {
                method: MigrationMethod::Ctas,
                target_table: target,
                retained_table: None,
                baseline_table: Some(table.to_string()),
                rollback_possible: true,
                rows_copied: Some(rows),
            });
        }

        let retired = suffixed(table, OLD_SUFFIX, max_len);
        cutover(ctx, owner, table, &target, &retired).await?;
        objects::swap_names(ctx, owner, Some(&retired), table, &renames, max_len).await;

        if job.config.rename_partitions {
            rename_system_partitions(ctx, owner, table, built.partition_type, built.interval, max_len).await;
        }

        Ok(StrategyReport {
            method: MigrationMethod::Ctas,
            target_table: table.to_string(),
            retained_table: Some(retired.clone()),
            baseline_table: Some(retired),
            rollback_possible: true,
            rows_copied: Some(rows),
        })
    }
}

/// 복사, 종속 객체 재생성, 통계 갱신
async fn populate(
    job: &MigrationJob<'_>,
    ctx: &ExecutionContext,
    built: &BuiltTable,
    target: &str,
) -> Result<(u64, Vec<ObjectRename>)> {
    let task = job.task;
    let copy = built.copy_statement(&task.owner, &task.table_name, job.parallel());
    let rows = ctx.execute("COPY_DATA", StepType::Dml, &copy).await?;
    ctx.execute("COMMIT", StepType::Dml, "COMMIT").await?;

    let request = RebuildRequest {
        owner: &task.owner,
        source_table: &task.table_name,
        target_table: target,
        partition_key: &task.partition_key,
        conversion: built.conversion.as_ref(),
        max_identifier_length: job.config.max_identifier_length,
    };
    let renames = objects::rebuild(ctx, &request).await?;

    refresh_statistics(ctx, &task.owner, target, job.parallel()).await;
    Ok((rows, renames))
}

/// 원본을 _OLD로, 새 테이블을 원래 이름으로 변경
///
/// 두 번째 변경이 실패하면 원본 이름을 되돌리고 새 테이블을 정리합니다.
async fn cutover(ctx: &ExecutionContext, owner: &str, table: &str, target: &str, retired: &str) -> Result<()> {
    if let Err(e) = ctx
        .execute("RENAME_ORIGINAL", StepType::Cutover, &rename_table_sql(owner, table, retired))
        .await
    {
        drop_new_table(ctx, owner, target).await;
        return Err(e);
    }

    if let Err(e) = ctx
        .execute("RENAME_NEW_TABLE", StepType::Cutover, &rename_table_sql(owner, target, table))
        .await
    {
        warn!("새 테이블 이름 변경 실패 - 원본 이름 복원: {}.{}", owner, table);
        ctx.execute_tolerant("RESTORE_ORIGINAL", StepType::Cleanup, &rename_table_sql(owner, retired, table))
            .await;
        drop_new_table(ctx, owner, target).await;
        return Err(e);
    }
    Ok(())
}

async fn drop_new_table(ctx: &ExecutionContext, owner: &str, table: &str) {
    ctx.execute_tolerant("CLEANUP_DROP_TABLE", StepType::Cleanup, &drop_table_sql(owner, table))
        .await;
}
