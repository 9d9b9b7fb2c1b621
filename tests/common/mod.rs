#![allow(dead_code)]

// 통합 테스트 공용 도구
// 메모리 작업 저장소와 구문을 기록하며 테이블 상태를 흉내 내는 엔진

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use tiered_migrator::config::MigrationConfig;
use tiered_migrator::engine::{ColumnInfo, DependentObject, Engine, EngineResult, ObjectKind, PartitionInfo};
use tiered_migrator::error::{store_err, EngineError, Result};
use tiered_migrator::ilm::IlmPlan;
use tiered_migrator::model::{
    AnalysisRecord, ExecutionStep, MigrationTask, StepStatus, TierTemplate,
};
use tiered_migrator::{Orchestrator, TaskStore};

pub const OWNER: &str = "DW";

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 엔진 안의 테이블 하나
#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub rows: i64,
    pub columns: Vec<ColumnInfo>,
    pub objects: Vec<DependentObject>,
    pub partitions: Vec<PartitionInfo>,
    pub primary_key: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Default)]
struct EngineState {
    tables: HashMap<String, FakeTable>,
    statements: Vec<String>,
    failures: Vec<(String, EngineError)>,
    /// 새로 만든 파티션 테이블에 붙일 시스템 파티션
    created_partitions: Vec<PartitionInfo>,
    /// INSERT 복사에서 빠지는 행 수
    copy_loss: i64,
}

/// 실행 구문을 기록하고 이름 변경, 삭제, 복사, 교환을 상태에 반영하는 엔진
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<EngineState>,
}

/// 구문 안의 큰따옴표 식별자 목록
fn quoted(sql: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = sql;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('"') else { break };
        names.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    names
}

/// PL/SQL 호출의 이름 있는 문자열 인자
fn named_literal(sql: &str, param: &str) -> Option<String> {
    let marker = format!("{} => '", param);
    let start = sql.find(&marker)? + marker.len();
    let end = sql[start..].find('\'')?;
    Some(sql[start..start + end].to_string())
}

fn missing(table: &str) -> EngineError {
    EngineError::failed(format!("ORA-00942: table or view does not exist: {}", table))
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_table(&self, name: &str, table: FakeTable) {
        self.state.lock().unwrap().tables.insert(name.to_string(), table);
    }

    pub fn table(&self, name: &str) -> Option<FakeTable> {
        self.state.lock().unwrap().tables.get(name).cloned()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.state.lock().unwrap().tables.contains_key(name)
    }

    pub fn set_rows(&self, name: &str, rows: i64) {
        if let Some(table) = self.state.lock().unwrap().tables.get_mut(name) {
            table.rows = rows;
        }
    }

    /// 구문에 substring이 들어 있으면 error로 실패
    pub fn fail_on(&self, substring: &str, error: EngineError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((substring.to_string(), error));
    }

    pub fn set_created_partitions(&self, partitions: Vec<PartitionInfo>) {
        self.state.lock().unwrap().created_partitions = partitions;
    }

    pub fn lose_rows_on_copy(&self, rows: i64) {
        self.state.lock().unwrap().copy_loss = rows;
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn position(&self, substring: &str) -> Option<usize> {
        self.statements().iter().position(|s| s.contains(substring))
    }

    fn apply(state: &mut EngineState, sql: &str) -> EngineResult<u64> {
        let names = quoted(sql);
        let name = |i: usize| names.get(i).cloned().unwrap_or_default();

        if sql.starts_with("CREATE TABLE") && sql.contains(" AS SELECT ") {
            let source = quoted(&sql[sql.rfind(" FROM ").unwrap_or(0)..]);
            let source = source.get(1).cloned().unwrap_or_default();
            let copy = state.tables.get(&source).cloned().ok_or_else(|| missing(&source))?;
            let rows = copy.rows;
            state.tables.insert(
                name(1),
                FakeTable {
                    rows,
                    columns: copy.columns,
                    ..FakeTable::default()
                },
            );
            return Ok(rows as u64);
        }
        if sql.starts_with("CREATE TABLE") {
            let partitions = state.created_partitions.clone();
            state.tables.insert(
                name(1),
                FakeTable {
                    partitions,
                    ..FakeTable::default()
                },
            );
            return Ok(0);
        }
        if sql.starts_with("INSERT") {
            let source = quoted(&sql[sql.rfind(" FROM ").unwrap_or(0)..]);
            let source = source.get(1).cloned().unwrap_or_default();
            let rows = state.tables.get(&source).map(|t| t.rows).ok_or_else(|| missing(&source))?;
            let rows = (rows - state.copy_loss).max(0);
            let target = state.tables.get_mut(&name(1)).ok_or_else(|| missing(&name(1)))?;
            target.rows += rows;
            return Ok(rows as u64);
        }
        if sql.starts_with("DROP TABLE") {
            return match state.tables.remove(&name(1)) {
                Some(_) => Ok(0),
                None => Err(missing(&name(1))),
            };
        }
        if sql.starts_with("DROP INDEX") {
            for table in state.tables.values_mut() {
                table.objects.retain(|o| o.name != name(1));
            }
            return Ok(0);
        }
        if sql.starts_with("ALTER TABLE") && sql.contains(" RENAME CONSTRAINT ") {
            let table = state.tables.get_mut(&name(1)).ok_or_else(|| missing(&name(1)))?;
            let object = table
                .objects
                .iter_mut()
                .find(|o| o.name == name(2))
                .ok_or_else(|| EngineError::failed(format!("ORA-23292: no constraint {}", name(2))))?;
            object.name = name(3);
            return Ok(0);
        }
        if sql.starts_with("ALTER TABLE") && sql.contains(" RENAME PARTITION ") {
            let table = state.tables.get_mut(&name(1)).ok_or_else(|| missing(&name(1)))?;
            if let Some(p) = table.partitions.iter_mut().find(|p| p.name == name(2)) {
                p.name = name(3);
            }
            return Ok(0);
        }
        if sql.starts_with("ALTER TABLE") && sql.contains(" RENAME TO ") {
            if state.tables.contains_key(&name(2)) {
                return Err(EngineError::failed(format!("ORA-00955: name is already used: {}", name(2))));
            }
            let table = state.tables.remove(&name(1)).ok_or_else(|| missing(&name(1)))?;
            state.tables.insert(name(2), table);
            return Ok(0);
        }
        if sql.starts_with("ALTER TABLE") && sql.contains(" ADD CONSTRAINT ") {
            let kind = if sql.contains("PRIMARY KEY") {
                ObjectKind::PrimaryKey
            } else if sql.contains("FOREIGN KEY") {
                ObjectKind::ForeignKey
            } else if sql.contains(" UNIQUE") {
                ObjectKind::Unique
            } else {
                ObjectKind::Check
            };
            let table = state.tables.get_mut(&name(1)).ok_or_else(|| missing(&name(1)))?;
            let unique = matches!(kind, ObjectKind::PrimaryKey | ObjectKind::Unique);
            // 암시적 인덱스는 제약 조건 이름을 따름
            table.objects.push(DependentObject {
                name: name(2),
                kind,
                definition: sql.to_string(),
                columns: Vec::new(),
                unique,
                backing_index: unique.then(|| name(2)),
            });
            return Ok(0);
        }
        if sql.contains(" EXCHANGE PARTITION ") {
            let shell = state.tables.get(&name(1)).map(|t| t.rows).ok_or_else(|| missing(&name(1)))?;
            let table = state.tables.get(&name(4)).map(|t| t.rows).ok_or_else(|| missing(&name(4)))?;
            if let Some(t) = state.tables.get_mut(&name(1)) {
                t.rows = table;
            }
            if let Some(t) = state.tables.get_mut(&name(4)) {
                t.rows = shell;
            }
            return Ok(0);
        }
        if sql.starts_with("CREATE") && sql.contains(" INDEX ") {
            let unique = sql.starts_with("CREATE UNIQUE");
            let table = state.tables.get_mut(&name(3)).ok_or_else(|| missing(&name(3)))?;
            table.objects.push(DependentObject {
                name: name(1),
                kind: ObjectKind::Index,
                definition: sql.to_string(),
                columns: names.iter().skip(4).cloned().collect(),
                unique,
                backing_index: None,
            });
            return Ok(0);
        }
        if sql.starts_with("ALTER INDEX") && sql.contains(" RENAME TO ") {
            // 인덱스 이름은 스키마 안에서 유일
            let taken = state
                .tables
                .values()
                .flat_map(|t| t.objects.iter())
                .any(|o| o.index_name() == Some(name(2).as_str()));
            if taken {
                return Err(EngineError::failed(format!("ORA-00955: name is already used: {}", name(2))));
            }
            let object = state
                .tables
                .values_mut()
                .flat_map(|t| t.objects.iter_mut())
                .find(|o| o.index_name() == Some(name(1).as_str()))
                .ok_or_else(|| EngineError::failed(format!("ORA-01418: index {} does not exist", name(1))))?;
            match object.kind {
                ObjectKind::Index => object.name = name(2),
                _ => object.backing_index = Some(name(2)),
            }
            return Ok(0);
        }
        if sql.contains("DBMS_REDEFINITION.START_REDEF_TABLE") {
            let orig = named_literal(sql, "orig_table").unwrap_or_default();
            let interim = named_literal(sql, "int_table").unwrap_or_default();
            let rows = state.tables.get(&orig).map(|t| t.rows).ok_or_else(|| missing(&orig))?;
            let target = state.tables.get_mut(&interim).ok_or_else(|| missing(&interim))?;
            target.rows = rows;
            return Ok(0);
        }
        if sql.contains("DBMS_REDEFINITION.FINISH_REDEF_TABLE") {
            let orig = named_literal(sql, "orig_table").unwrap_or_default();
            let interim = named_literal(sql, "int_table").unwrap_or_default();
            let original = state.tables.remove(&orig).ok_or_else(|| missing(&orig))?;
            let redefined = state.tables.remove(&interim).ok_or_else(|| missing(&interim))?;
            state.tables.insert(orig, redefined);
            state.tables.insert(interim, original);
            return Ok(0);
        }
        Ok(0)
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn execute(&self, sql: &str) -> EngineResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());
        if let Some((_, error)) = state.failures.iter().find(|(s, _)| sql.contains(s.as_str())) {
            return Err(error.clone());
        }
        Self::apply(&mut state, sql)
    }

    async fn table_exists(&self, _owner: &str, table: &str) -> EngineResult<bool> {
        Ok(self.has_table(table))
    }

    async fn columns(&self, _owner: &str, table: &str) -> EngineResult<Vec<ColumnInfo>> {
        self.table(table).map(|t| t.columns).ok_or_else(|| missing(table))
    }

    async fn row_count(&self, _owner: &str, table: &str) -> EngineResult<i64> {
        self.table(table).map(|t| t.rows).ok_or_else(|| missing(table))
    }

    async fn segment_bytes(&self, _owner: &str, table: &str) -> EngineResult<i64> {
        self.table(table).map(|t| t.rows * 100).ok_or_else(|| missing(table))
    }

    async fn primary_key(&self, _owner: &str, table: &str) -> EngineResult<Option<String>> {
        self.table(table).map(|t| t.primary_key).ok_or_else(|| missing(table))
    }

    async fn dependent_objects(&self, _owner: &str, table: &str) -> EngineResult<Vec<DependentObject>> {
        self.table(table).map(|t| t.objects).ok_or_else(|| missing(table))
    }

    async fn partitions(&self, _owner: &str, table: &str) -> EngineResult<Vec<PartitionInfo>> {
        self.table(table).map(|t| t.partitions).ok_or_else(|| missing(table))
    }

    async fn date_range(
        &self,
        _owner: &str,
        table: &str,
        _column: &str,
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>> {
        self.table(table).map(|t| t.date_range).ok_or_else(|| missing(table))
    }
}

#[derive(Default)]
struct StoreState {
    tasks: HashMap<i64, MigrationTask>,
    analyses: HashMap<i64, AnalysisRecord>,
    templates: HashMap<String, TierTemplate>,
    steps: Vec<ExecutionStep>,
    ilm: Vec<IlmPlan>,
    locked: HashSet<i64>,
    /// 저장할 ILM 정책 최대 수 (부분 저장 흉내)
    ilm_limit: Option<usize>,
}

/// 메모리 작업 저장소
#[derive(Default)]
pub struct MemoryTaskStore {
    state: Mutex<StoreState>,
}

impl MemoryTaskStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_task(&self, task: MigrationTask) {
        self.state.lock().unwrap().tasks.insert(task.id, task);
    }

    pub fn put_analysis(&self, analysis: AnalysisRecord) {
        self.state.lock().unwrap().analyses.insert(analysis.task_id, analysis);
    }

    pub fn put_template(&self, template: TierTemplate) {
        self.state.lock().unwrap().templates.insert(template.name.clone(), template);
    }

    pub fn task(&self, id: i64) -> MigrationTask {
        self.state.lock().unwrap().tasks.get(&id).cloned().unwrap()
    }

    pub fn steps(&self) -> Vec<ExecutionStep> {
        self.state.lock().unwrap().steps.clone()
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps().into_iter().map(|s| s.step_name).collect()
    }

    pub fn steps_with_status(&self, status: StepStatus) -> Vec<ExecutionStep> {
        self.steps().into_iter().filter(|s| s.status == status).collect()
    }

    pub fn ilm_plans(&self) -> Vec<IlmPlan> {
        self.state.lock().unwrap().ilm.clone()
    }

    pub fn limit_ilm(&self, limit: usize) {
        self.state.lock().unwrap().ilm_limit = Some(limit);
    }

    pub fn is_locked(&self, id: i64) -> bool {
        self.state.lock().unwrap().locked.contains(&id)
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn lock_task(&self, task_id: i64) -> Result<bool> {
        Ok(self.state.lock().unwrap().locked.insert(task_id))
    }

    async fn release_task(&self, task_id: i64) -> Result<()> {
        self.state.lock().unwrap().locked.remove(&task_id);
        Ok(())
    }

    async fn load_task(&self, task_id: i64) -> Result<Option<MigrationTask>> {
        Ok(self.state.lock().unwrap().tasks.get(&task_id).cloned())
    }

    async fn load_analysis(&self, task_id: i64) -> Result<Option<AnalysisRecord>> {
        Ok(self.state.lock().unwrap().analyses.get(&task_id).cloned())
    }

    async fn load_tier_template(&self, name: &str) -> Result<Option<TierTemplate>> {
        Ok(self.state.lock().unwrap().templates.get(name).cloned())
    }

    async fn update_task(&self, task: &MigrationTask) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(store_err(format!("작업 {} 없음", task.id))),
        }
    }

    async fn append_step(&self, step: &ExecutionStep) -> Result<()> {
        self.state.lock().unwrap().steps.push(step.clone());
        Ok(())
    }

    async fn save_ilm_policies(&self, plan: &IlmPlan) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let saved = match state.ilm_limit {
            Some(limit) => plan.policies.len().min(limit),
            None => plan.policies.len(),
        };
        state.ilm.push(plan.clone());
        Ok(saved)
    }
}

pub const TEMPLATE: &str = r#"
name: sales_tiers
hot:
  age_months: 3
  interval: MONTHLY
  tablespace: hot_ts
  compression: NONE
warm:
  age_months: 12
  interval: QUARTERLY
  tablespace: warm_ts
  compression: BASIC
cold:
  age_months: 36
  interval: YEARLY
  tablespace: cold_ts
  compression: ARCHIVE HIGH
"#;

pub fn columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo {
            name: "ID".to_string(),
            data_type: "NUMBER(12)".to_string(),
            nullable: false,
            default: None,
        },
        ColumnInfo {
            name: "SALE_DATE".to_string(),
            data_type: "DATE".to_string(),
            nullable: true,
            default: None,
        },
        ColumnInfo {
            name: "SALE_DAY".to_string(),
            data_type: "NUMBER(8)".to_string(),
            nullable: true,
            default: None,
        },
        ColumnInfo {
            name: "REGION".to_string(),
            data_type: "VARCHAR2(20 BYTE)".to_string(),
            nullable: true,
            default: None,
        },
    ]
}

pub fn sales_objects() -> Vec<DependentObject> {
    vec![
        DependentObject {
            name: "IX_SALES_REGION".to_string(),
            kind: ObjectKind::Index,
            definition: "CREATE INDEX \"DW\".\"IX_SALES_REGION\" ON \"DW\".\"SALES\" (\"REGION\")".to_string(),
            columns: vec!["REGION".to_string()],
            unique: false,
            backing_index: None,
        },
        DependentObject {
            name: "PK_SALES".to_string(),
            kind: ObjectKind::PrimaryKey,
            definition: "ALTER TABLE \"DW\".\"SALES\" ADD CONSTRAINT \"PK_SALES\" PRIMARY KEY (\"ID\") ENABLE"
                .to_string(),
            columns: Vec::new(),
            unique: true,
            backing_index: Some("PK_SALES".to_string()),
        },
    ]
}

/// 2024-06-15 기준 원본 SALES 테이블과 작업 1
pub struct Fixture {
    pub engine: Arc<FakeEngine>,
    pub store: Arc<MemoryTaskStore>,
    pub config: MigrationConfig,
}

pub const SOURCE_ROWS: i64 = 5_000;

impl Fixture {
    pub fn new(method: &str) -> Self {
        let engine = FakeEngine::new();
        engine.add_table(
            "SALES",
            FakeTable {
                rows: SOURCE_ROWS,
                columns: columns(),
                objects: sales_objects(),
                partitions: Vec::new(),
                primary_key: Some("PK_SALES".to_string()),
                date_range: Some((d(2021, 1, 5), d(2024, 6, 10))),
            },
        );

        let store = MemoryTaskStore::new();
        let mut task = MigrationTask::new(1, OWNER, "SALES", "RANGE", "SALE_DATE", method);
        task.interval_clause = Some("MONTHLY".to_string());
        store.put_task(task);
        store.put_analysis(AnalysisRecord {
            task_id: 1,
            date_column: Some("SALE_DATE".to_string()),
            date_column_type: Some("DATE".to_string()),
            min_date: Some(d(2021, 1, 5)),
            max_date: Some(d(2024, 6, 10)),
            row_count: Some(SOURCE_ROWS),
            ..AnalysisRecord::default()
        });

        let config = MigrationConfig {
            online_min_rows: 1_000,
            ..MigrationConfig::default()
        };
        Self { engine, store, config }
    }

    pub fn with_template(self) -> Self {
        let template = TierTemplate::parse("sales_tiers", TEMPLATE).unwrap();
        self.store.put_template(template);
        self.update_task(|t| t.tier_template = Some("sales_tiers".to_string()));
        self
    }

    pub fn update_task<F: FnOnce(&mut MigrationTask)>(&self, f: F) {
        let mut task = self.store.task(1);
        f(&mut task);
        self.store.put_task(task);
    }

    pub fn update_analysis<F: FnOnce(&mut AnalysisRecord)>(&self, f: F) {
        let mut analysis = self
            .store
            .state
            .lock()
            .unwrap()
            .analyses
            .get(&1)
            .cloned()
            .unwrap_or_default();
        f(&mut analysis);
        self.store.put_analysis(analysis);
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::clone(&self.engine) as Arc<dyn Engine>,
            Arc::clone(&self.store) as Arc<dyn TaskStore>,
            self.config.clone(),
        )
    }
}
