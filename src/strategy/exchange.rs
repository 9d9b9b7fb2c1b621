use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info, warn};

use crate::constants::{EMPTY_SUFFIX, MIGR_SUFFIX};
use crate::context::ExecutionContext;
use crate::error::{validation_err, Result};
use crate::ident::{qualified, quote, suffixed};
use crate::model::{MigrationMethod, PartitionType, StepType};
use crate::objects::{self, RebuildRequest};
use crate::partition::ddl::{RangeBound, RangePartition};
use crate::partition::{Granularity, PartitionSpec, StorageClause};
use super::{
    build_table, drop_table_sql, refresh_statistics, rename_table_sql, Capability, MigrationJob, MigrationStrategy,
    NativePath, StrategyReport,
};

/// 단일 파티션 셸과 원본 테이블을 메타데이터만으로 교환
pub struct ExchangeStrategy;

/// 간격 절이 없으면 월 단위 기간으로 판단
const DEFAULT_EXCHANGE_GRANULARITY: Granularity = Granularity::Monthly;

/// 데이터 범위가 한 기간 안에 있으면 그 기간 시작일
pub fn single_period(min: NaiveDate, max: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    let start = granularity.floor(min);
    if start == granularity.floor(max) {
        Some(start)
    } else {
        None
    }
}

fn exchange_sql(owner: &str, shell: &str, partition: &str, table: &str) -> String {
    format!(
        "ALTER TABLE {} EXCHANGE PARTITION {} WITH TABLE {} INCLUDING INDEXES WITHOUT VALIDATION",
        qualified(owner, shell),
        quote(partition),
        qualified(owner, table)
    )
}

fn fallback(reason: impl Into<String>) -> Result<Capability> {
    Ok(Capability::Fallback { reason: reason.into() })
}

#[async_trait]
impl MigrationStrategy for ExchangeStrategy {
    fn method(&self) -> MigrationMethod {
        MigrationMethod::Exchange
    }

    async fn probe(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext) -> Result<Capability> {
        let task = job.task;
        if job.requires_conversion() {
            return fallback("교환 방식은 컬럼 타입 변환을 지원하지 않습니다");
        }
        if PartitionType::parse(&task.partition_type)? != PartitionType::Range {
            return fallback("교환 방식은 RANGE 파티션만 지원합니다");
        }
        let Some(column) = job.analysis.and_then(|a| a.date_column.as_deref()) else {
            return fallback("날짜 컬럼이 지정되지 않았습니다");
        };

        let granularity = task.interval()?.unwrap_or(DEFAULT_EXCHANGE_GRANULARITY);

        let range = match job.analysis.and_then(|a| a.date_range()) {
            Some(range) => Some(range),
            None => ctx.engine().date_range(&task.owner, &task.table_name, column).await?,
        };
        let Some((min, max)) = range else {
            return fallback("데이터 범위를 확인할 수 없습니다");
        };

        match single_period(min, max, granularity) {
            Some(period_start) => {
                info!("[{}] 교환 가능: {} ~ {} ({})", task.id, min, max, granularity.as_str());
                Ok(Capability::Native(NativePath::Exchange { period_start, granularity }))
            }
            None => fallback(format!(
                "데이터 범위 {} ~ {} 가 {} 기간 하나를 넘습니다",
                min,
                max,
                granularity.as_str()
            )),
        }
    }

    async fn execute(&self, job: &MigrationJob<'_>, ctx: &ExecutionContext, path: NativePath) -> Result<StrategyReport> {
        let NativePath::Exchange { period_start, granularity } = path else {
            return Err(validation_err("교환 경로가 아닌 실행 요청"));
        };
        let task = job.task;
        let owner = task.owner.as_str();
        let table = task.table_name.as_str();
        let max_len = job.config.max_identifier_length;
        let shell = suffixed(table, MIGR_SUFFIX, max_len);
        let partition = granularity.partition_name(period_start);

        objects::cleanup_stale(ctx, owner, &shell).await?;
        let built = build_table(job, ctx, &shell).await?;
        let key = built.partition_key.clone();
        let built = built.with_partitioning(PartitionSpec::Range {
            key,
            interval: Some(granularity),
            partitions: vec![RangePartition {
                name: partition.clone(),
                upper: RangeBound::Date(granularity.next_boundary(period_start)),
                storage: StorageClause::default(),
            }],
        });
        ctx.execute("CREATE_SHELL", StepType::Ddl, &built.sql).await?;

        let request = RebuildRequest {
            owner,
            source_table: table,
            target_table: &shell,
            partition_key: &task.partition_key,
            conversion: None,
            max_identifier_length: max_len,
        };
        let prepared = match objects::rebuild(ctx, &request).await {
            Ok(renames) => ctx
                .execute("EXCHANGE_PARTITION", StepType::Exchange, &exchange_sql(owner, &shell, &partition, table))
                .await
                .map(|_| renames),
            Err(e) => Err(e),
        };
        let renames = match prepared {
            Ok(renames) => renames,
            Err(e) => {
                error!("[{}] 교환 준비 실패 - 셸 정리: {}", task.id, e);
                ctx.execute_tolerant("CLEANUP_DROP_TABLE", StepType::Cleanup, &drop_table_sql(owner, &shell))
                    .await;
                return Err(e);
            }
        };

        // 교환 후 데이터는 셸에 있고 원본은 비어 있음
        let emptied = suffixed(table, EMPTY_SUFFIX, max_len);
        if let Err(e) = ctx
            .execute("RENAME_ORIGINAL", StepType::Cutover, &rename_table_sql(owner, table, &emptied))
            .await
        {
            exchange_back(ctx, owner, &shell, &partition, table).await;
            return Err(e);
        }
        if let Err(e) = ctx
            .execute("RENAME_SHELL", StepType::Cutover, &rename_table_sql(owner, &shell, table))
            .await
        {
            warn!("[{}] 셸 이름 변경 실패 - 교환 되돌림", task.id);
            ctx.execute_tolerant("RESTORE_ORIGINAL", StepType::Cleanup, &rename_table_sql(owner, &emptied, table))
                .await;
            exchange_back(ctx, owner, &shell, &partition, table).await;
            return Err(e);
        }

        objects::swap_names(ctx, owner, Some(&emptied), table, &renames, max_len).await;
        refresh_statistics(ctx, owner, table, job.parallel()).await;

        Ok(StrategyReport {
            method: MigrationMethod::Exchange,
            target_table: table.to_string(),
            retained_table: Some(emptied),
            baseline_table: None,
            rollback_possible: false,
            rows_copied: None,
        })
    }
}

/// 교환을 한 번 더 수행해 데이터를 원본으로 되돌리고 셸 정리
async fn exchange_back(ctx: &ExecutionContext, owner: &str, shell: &str, partition: &str, table: &str) {
    if ctx
        .execute_tolerant("EXCHANGE_BACK", StepType::Cleanup, &exchange_sql(owner, shell, partition, table))
        .await
    {
        ctx.execute_tolerant("CLEANUP_DROP_TABLE", StepType::Cleanup, &drop_table_sql(owner, shell))
            .await;
    }
}
