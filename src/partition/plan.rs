// 파티션 DDL 빌더
// 균일(Uniform) 계획과 계층(Tiered) 계획 중 하나를 골라 생성 구문을 만듭니다.
// 이 모듈은 아무것도 실행하지 않고 텍스트만 반환합니다.

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};

use crate::constants::{CONVERTED_SUFFIX, INITIAL_PARTITION, MAXVALUE_PARTITION, NULL_PARTITION};
use crate::engine::ColumnInfo;
use crate::error::{validation_err, Result};
use crate::ident::{literal, qualified, quote, suffixed};
use crate::model::{AnalysisRecord, MigrationTask, PartitionType, Tier, TierTemplate};
use super::boundary::{calculate_tiered, uniform_lower_boundary, BoundaryInput, TierBoundaries, TierWindow};
use super::ddl::{
    ColumnDef, Compression, CreateTableStatement, ListPartition, PartitionSpec, RangeBound, RangePartition,
    StorageClause,
};
use super::interval::Granularity;

/// 계획 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    Uniform,
    Tiered,
}

/// 파티션 계획 - 테이블 기본 저장 속성과 파티션 절을 결정
pub trait PartitionPlan {
    fn mode(&self) -> PlanMode;
    fn table_storage(&self) -> StorageClause;
    fn partition_spec(&self, key: &str) -> Result<PartitionSpec>;
}

/// 단일 키 균일 레이아웃
pub struct UniformPartitionPlan {
    pub partition_type: PartitionType,
    pub interval: Option<Granularity>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub now: NaiveDate,
    pub buffer_periods: u32,
    pub hash_partitions: u32,
    pub storage: StorageClause,
}

impl PartitionPlan for UniformPartitionPlan {
    fn mode(&self) -> PlanMode {
        PlanMode::Uniform
    }

    fn table_storage(&self) -> StorageClause {
        self.storage.clone()
    }

    fn partition_spec(&self, key: &str) -> Result<PartitionSpec> {
        let key = key.to_string();
        match self.partition_type {
            PartitionType::Range => match self.interval {
                Some(granularity) => {
                    let source_min = self.date_range.map(|(min, _)| min).unwrap_or(self.now);
                    let lower = uniform_lower_boundary(source_min, granularity, self.buffer_periods);
                    debug!("균일 INTERVAL 초기 경계: {} (원본 시작 {})", lower, source_min);
                    Ok(PartitionSpec::Range {
                        key,
                        interval: Some(granularity),
                        partitions: vec![RangePartition {
                            name: INITIAL_PARTITION.to_string(),
                            upper: RangeBound::Date(lower),
                            storage: StorageClause::default(),
                        }],
                    })
                }
                None => Ok(PartitionSpec::Range {
                    key,
                    interval: None,
                    partitions: yearly_partitions(self.date_range),
                }),
            },
            PartitionType::List => Ok(PartitionSpec::List {
                key,
                automatic: true,
                partitions: vec![ListPartition {
                    name: NULL_PARTITION.to_string(),
                    values: vec!["NULL".to_string()],
                }],
            }),
            PartitionType::Hash => Ok(PartitionSpec::Hash {
                key,
                count: self.hash_partitions.max(1),
            }),
        }
    }
}

/// 연 단위 명시 파티션 + MAXVALUE 파티션
fn yearly_partitions(date_range: Option<(NaiveDate, NaiveDate)>) -> Vec<RangePartition> {
    let mut partitions = Vec::new();
    if let Some((min, max)) = date_range {
        for year in min.year()..=max.year() {
            if let Some(upper) = NaiveDate::from_ymd_opt(year + 1, 1, 1) {
                partitions.push(RangePartition {
                    name: format!("P_{}", year),
                    upper: RangeBound::Date(upper),
                    storage: StorageClause::default(),
                });
            }
        }
    }
    partitions.push(RangePartition {
        name: MAXVALUE_PARTITION.to_string(),
        upper: RangeBound::MaxValue,
        storage: StorageClause::default(),
    });
    partitions
}

/// HOT/WARM/COLD 계층 레이아웃
pub struct TieredPartitionPlan<'a> {
    pub template: &'a TierTemplate,
    pub boundaries: TierBoundaries,
}

impl<'a> TieredPartitionPlan<'a> {
    pub fn new(
        template: &'a TierTemplate,
        date_range: Option<(NaiveDate, NaiveDate)>,
        now: NaiveDate,
    ) -> Result<Self> {
        let input = BoundaryInput {
            source_min: date_range.map(|(min, _)| min),
            source_max: date_range.map(|(_, max)| max),
            now,
            hot: TierWindow::from(&template.hot),
            warm: TierWindow::from(&template.warm),
            cold: TierWindow::from(&template.cold),
        };
        let boundaries = calculate_tiered(&input)?;
        debug!(
            "계층 파티션 경계: COLD {}개, WARM {}개, HOT {}개, INTERVAL 전환점 {:?}",
            boundaries.for_tier(Tier::Cold).count(),
            boundaries.for_tier(Tier::Warm).count(),
            boundaries.for_tier(Tier::Hot).count(),
            boundaries.transition_point()
        );
        Ok(Self { template, boundaries })
    }
}

impl PartitionPlan for TieredPartitionPlan<'_> {
    fn mode(&self) -> PlanMode {
        PlanMode::Tiered
    }

    /// 테이블 기본값은 HOT 계층 - INTERVAL 파티션이 이를 상속
    fn table_storage(&self) -> StorageClause {
        self.template.hot.storage()
    }

    fn partition_spec(&self, key: &str) -> Result<PartitionSpec> {
        let partitions = self
            .boundaries
            .partitions
            .iter()
            .map(|p| RangePartition {
                name: p.name.clone(),
                upper: RangeBound::Date(p.upper),
                storage: self.template.tier(p.tier).storage(),
            })
            .collect();

        Ok(PartitionSpec::Range {
            key: key.to_string(),
            interval: Some(self.template.hot.granularity),
            partitions,
        })
    }
}

/// 타입 변환 컬럼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConversion {
    pub source_column: String,
    pub target_column: String,
    pub target_type: String,
    /// 복사 시 SELECT 목록에 들어갈 변환 식
    pub expression: String,
}

/// DDL 빌드 요청
pub struct BuildRequest<'a> {
    pub task: &'a MigrationTask,
    pub analysis: Option<&'a AnalysisRecord>,
    pub template: Option<&'a TierTemplate>,
    pub columns: &'a [ColumnInfo],
    pub target_table: &'a str,
    pub now: NaiveDate,
    pub buffer_periods: u32,
    pub hash_partitions: u32,
    pub parallel: Option<u32>,
    pub max_identifier_length: usize,
}

/// 빌드 결과
#[derive(Debug, Clone)]
pub struct BuiltTable {
    pub statement: CreateTableStatement,
    pub sql: String,
    pub mode: PlanMode,
    pub partition_type: PartitionType,
    pub interval: Option<Granularity>,
    pub partition_key: String,
    pub conversion: Option<ColumnConversion>,
    insert_columns: Vec<String>,
    select_exprs: Vec<String>,
}

impl BuiltTable {
    /// 파티션 절 교체 후 다시 렌더링
    pub fn with_partitioning(mut self, partitioning: PartitionSpec) -> Self {
        self.statement.partitioning = partitioning;
        self.sql = self.statement.to_string();
        self
    }

    /// 원본에서 새 테이블로 행을 복사하는 구문
    pub fn copy_statement(&self, owner: &str, source_table: &str, parallel: Option<u32>) -> String {
        let hint = match parallel {
            Some(degree) => format!("/*+ APPEND PARALLEL({}) */", degree),
            None => "/*+ APPEND */".to_string(),
        };
        let target = qualified(&self.statement.owner, &self.statement.table);
        let source = qualified(owner, source_table);

        if self.conversion.is_none() {
            format!("INSERT {} INTO {} SELECT * FROM {}", hint, target, source)
        } else {
            format!(
                "INSERT {} INTO {} ({}) SELECT {} FROM {}",
                hint,
                target,
                self.insert_columns.join(", "),
                self.select_exprs.join(", "),
                source
            )
        }
    }
}

/// 작업과 분석 레코드로 파티션 테이블 생성 구문 빌드
///
/// 분석 레코드가 없으면 경고를 남기고 균일 모드로 대체합니다.
pub fn build_create_table(req: &BuildRequest<'_>) -> Result<BuiltTable> {
    let task = req.task;
    let partition_type = PartitionType::parse(&task.partition_type)?;
    let interval = task.interval()?;
    if interval.is_some() && partition_type != PartitionType::Range {
        warn!("{} 파티션에는 간격 절이 적용되지 않습니다: {}", partition_type.as_str(), task.display_name());
    }

    if req.columns.is_empty() {
        return Err(validation_err(format!("원본 테이블 컬럼 정보가 없습니다: {}", task.display_name())));
    }

    if req.analysis.is_none() {
        warn!("분석 레코드 없음 - 균일 모드로 대체: {}", task.display_name());
    }

    let derived = derive_columns(req)?;
    let partition_key = resolve_partition_key(task, &derived)?;
    let date_range = req.analysis.and_then(|a| a.date_range());

    let plan: Box<dyn PartitionPlan + '_> = match (req.template, req.analysis) {
        (Some(template), Some(_)) => {
            if partition_type != PartitionType::Range {
                return Err(validation_err(format!(
                    "계층 레이아웃은 RANGE 파티션만 지원합니다 (작업 유형: {})",
                    partition_type.as_str()
                )));
            }
            Box::new(TieredPartitionPlan::new(template, date_range, req.now)?)
        }
        (Some(template), None) => {
            warn!("계층 템플릿 {} 이 있지만 분석 레코드가 없어 균일 모드 사용", template.name);
            Box::new(uniform_plan(req, partition_type, interval, date_range)?)
        }
        (None, _) => Box::new(uniform_plan(req, partition_type, interval, date_range)?),
    };

    let partitioning = plan.partition_spec(&partition_key)?;
    let mode = plan.mode();

    let statement = CreateTableStatement {
        owner: task.owner.clone(),
        table: req.target_table.to_string(),
        columns: derived.defs,
        storage: plan.table_storage(),
        partitioning,
        // 범위/리스트 파티션 키 갱신을 허용
        row_movement: true,
        parallel: req.parallel,
    };
    let sql = statement.to_string();

    debug!("{:?} 모드 DDL 생성 완료: {}.{}", mode, task.owner, req.target_table);

    Ok(BuiltTable {
        statement,
        sql,
        mode,
        partition_type,
        interval: if partition_type == PartitionType::Range {
            match mode {
                PlanMode::Tiered => req.template.map(|t| t.hot.granularity),
                PlanMode::Uniform => interval,
            }
        } else {
            None
        },
        partition_key,
        conversion: derived.conversion,
        insert_columns: derived.insert_columns,
        select_exprs: derived.select_exprs,
    })
}

fn uniform_plan(
    req: &BuildRequest<'_>,
    partition_type: PartitionType,
    interval: Option<Granularity>,
    date_range: Option<(NaiveDate, NaiveDate)>,
) -> Result<UniformPartitionPlan> {
    let compression = match req.task.compression.as_deref() {
        Some(value) => Some(
            Compression::parse(value)
                .ok_or_else(|| validation_err(format!("압축 방식을 해석할 수 없습니다: {}", value)))?,
        ),
        None => None,
    };

    Ok(UniformPartitionPlan {
        partition_type,
        interval,
        date_range,
        now: req.now,
        buffer_periods: req.buffer_periods,
        hash_partitions: req.hash_partitions,
        storage: StorageClause {
            tablespace: req.task.tablespace.clone(),
            compression,
            pctfree: req.task.pctfree,
        },
    })
}

struct DerivedColumns {
    defs: Vec<ColumnDef>,
    insert_columns: Vec<String>,
    select_exprs: Vec<String>,
    conversion: Option<ColumnConversion>,
}

/// 컬럼 목록 생성 - 변환이 필요하면 변환 컬럼으로 대체
fn derive_columns(req: &BuildRequest<'_>) -> Result<DerivedColumns> {
    let convert = req.analysis.and_then(|a| a.conversion_column());
    let format = req
        .analysis
        .map(|a| a.conversion_format().to_string())
        .unwrap_or_default();

    let mut defs = Vec::with_capacity(req.columns.len());
    let mut insert_columns = Vec::with_capacity(req.columns.len());
    let mut select_exprs = Vec::with_capacity(req.columns.len());
    let mut conversion = None;

    for column in req.columns {
        let is_converted = convert
            .map(|c| c.eq_ignore_ascii_case(&column.name))
            .unwrap_or(false);

        if is_converted {
            let target = suffixed(&column.name, CONVERTED_SUFFIX, req.max_identifier_length);
            let expression = conversion_expression(column, &format);
            defs.push(ColumnDef {
                name: target.clone(),
                data_type: "DATE".to_string(),
                nullable: column.nullable,
                default: None,
            });
            insert_columns.push(quote(&target));
            select_exprs.push(format!("{} AS {}", expression, quote(&target)));
            conversion = Some(ColumnConversion {
                source_column: column.name.clone(),
                target_column: target,
                target_type: "DATE".to_string(),
                expression,
            });
        } else {
            defs.push(ColumnDef {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
                nullable: column.nullable,
                default: column.default.clone(),
            });
            insert_columns.push(quote(&column.name));
            select_exprs.push(quote(&column.name));
        }
    }

    if let Some(column) = convert {
        if conversion.is_none() {
            return Err(validation_err(format!("변환 대상 날짜 컬럼이 없습니다: {}", column)));
        }
    }

    Ok(DerivedColumns {
        defs,
        insert_columns,
        select_exprs,
        conversion,
    })
}

/// 원래 타입에 맞는 날짜 변환 식
fn conversion_expression(column: &ColumnInfo, format: &str) -> String {
    let data_type = column.data_type.to_ascii_uppercase();
    let col = quote(&column.name);
    if data_type.starts_with("NUMBER") || data_type.starts_with("INTEGER") || data_type.starts_with("FLOAT") {
        format!("TO_DATE(TO_CHAR({}), {})", col, literal(format))
    } else if data_type.contains("CHAR") {
        format!("TO_DATE({}, {})", col, literal(format))
    } else {
        format!("CAST({} AS DATE)", col)
    }
}

fn resolve_partition_key(task: &MigrationTask, derived: &DerivedColumns) -> Result<String> {
    if let Some(conversion) = &derived.conversion {
        if conversion.source_column.eq_ignore_ascii_case(&task.partition_key) {
            return Ok(conversion.target_column.clone());
        }
    }
    derived
        .defs
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(&task.partition_key))
        .map(|c| c.name.clone())
        .ok_or_else(|| validation_err(format!("파티션 키 컬럼이 없습니다: {}", task.partition_key)))
}
