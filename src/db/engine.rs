// PG 와이어 프로토콜 대상 엔진 어댑터
// 데이터 사전 조회와 구문 실행을 엔진 인터페이스로 감쌉니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, trace};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, SimpleQueryMessage};

use super::pool::DatabasePool;
use crate::constants::catalog;
use crate::engine::{ColumnInfo, DependentObject, Engine, EngineResult, ObjectKind, PartitionInfo};
use crate::error::EngineError;
use crate::ident::{qualified, quote};

/// 풀 기반 대상 엔진
pub struct PgEngine {
    pool: Arc<DatabasePool>,
}

impl PgEngine {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> EngineResult<Vec<Row>> {
        let client = self
            .pool
            .get_client()
            .await
            .map_err(|e| EngineError::failed(e.to_string()))?;
        trace!("카탈로그 조회: {}", sql.trim());
        client.query(sql, params).await.map_err(engine_error)
    }

    async fn query_scalar(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> EngineResult<Option<String>> {
        let rows = self.query(sql, params).await?;
        match rows.first() {
            Some(row) => text(row, 0),
            None => Ok(None),
        }
    }
}

/// 드라이버 오류를 엔진 오류로 분류
///
/// SQLSTATE로 분류되지 않으면 메시지 안의 엔진 고유 코드로 한 번 더 시도합니다.
fn engine_error(e: tokio_postgres::Error) -> EngineError {
    let message = match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    };
    let sqlstate = e.code().map(|c| c.code().to_string());
    match EngineError::classify(sqlstate.as_deref(), &message) {
        EngineError::Failed { .. } => match EngineError::classify(None, &message) {
            EngineError::Failed { .. } => EngineError::Failed {
                code: sqlstate,
                message,
            },
            classified => classified,
        },
        classified => classified,
    }
}

fn text(row: &Row, idx: usize) -> EngineResult<Option<String>> {
    row.try_get::<_, Option<String>>(idx)
        .map_err(|e| EngineError::failed(format!("카탈로그 결과 해석 실패 (컬럼 {}): {}", idx, e)))
}

fn number(value: Option<String>) -> EngineResult<i64> {
    match value {
        None => Ok(0),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .map_err(|_| EngineError::failed(format!("숫자가 아닌 카탈로그 값: {}", v))),
    }
}

fn parse_date(value: Option<String>) -> EngineResult<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| EngineError::failed(format!("날짜가 아닌 값: {}", v))),
    }
}

/// 데이터 사전 타입 정보를 DDL용 타입 문자열로 렌더링
pub fn render_type(
    data_type: &str,
    length: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
    char_used: Option<&str>,
) -> String {
    match data_type {
        "VARCHAR2" | "CHAR" => {
            let semantics = if char_used == Some("C") { "CHAR" } else { "BYTE" };
            format!("{}({} {})", data_type, length.unwrap_or(1), semantics)
        }
        "NVARCHAR2" | "NCHAR" | "RAW" => format!("{}({})", data_type, length.unwrap_or(1)),
        "NUMBER" => match (precision, scale) {
            (Some(p), Some(s)) if s != 0 => format!("NUMBER({},{})", p, s),
            (Some(p), _) => format!("NUMBER({})", p),
            (None, Some(0)) => "NUMBER(*,0)".to_string(),
            (None, _) => "NUMBER".to_string(),
        },
        "FLOAT" => match precision {
            Some(p) => format!("FLOAT({})", p),
            None => "FLOAT".to_string(),
        },
        other => other.to_string(),
    }
}

fn optional_number(value: Option<String>) -> EngineResult<Option<i64>> {
    match value {
        None => Ok(None),
        v => number(v).map(Some),
    }
}

#[async_trait]
impl Engine for PgEngine {
    async fn execute(&self, sql: &str) -> EngineResult<u64> {
        let client = self
            .pool
            .get_client()
            .await
            .map_err(|e| EngineError::failed(e.to_string()))?;
        debug!("구문 실행: {}", sql);
        let messages = client.simple_query(sql).await.map_err(engine_error)?;
        let affected = messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(rows) => *rows,
                _ => 0,
            })
            .sum();
        Ok(affected)
    }

    async fn table_exists(&self, owner: &str, table: &str) -> EngineResult<bool> {
        let count = number(self.query_scalar(catalog::TABLE_EXISTS, &[&owner, &table]).await?)?;
        Ok(count > 0)
    }

    async fn columns(&self, owner: &str, table: &str) -> EngineResult<Vec<ColumnInfo>> {
        let rows = self.query(catalog::COLUMNS, &[&owner, &table]).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = text(row, 0)?.unwrap_or_default();
            let data_type = text(row, 1)?.unwrap_or_default();
            let length = optional_number(text(row, 2)?)?;
            let precision = optional_number(text(row, 3)?)?;
            let scale = optional_number(text(row, 4)?)?;
            let char_used = text(row, 5)?;
            let nullable = text(row, 6)?.as_deref() != Some("N");
            let default = text(row, 7)?
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
            columns.push(ColumnInfo {
                name,
                data_type: render_type(&data_type, length, precision, scale, char_used.as_deref()),
                nullable,
                default,
            });
        }
        Ok(columns)
    }

    async fn row_count(&self, owner: &str, table: &str) -> EngineResult<i64> {
        let sql = catalog::row_count(&qualified(owner, table));
        number(self.query_scalar(&sql, &[]).await?)
    }

    async fn segment_bytes(&self, owner: &str, table: &str) -> EngineResult<i64> {
        number(self.query_scalar(catalog::SEGMENT_BYTES, &[&owner, &table]).await?)
    }

    async fn primary_key(&self, owner: &str, table: &str) -> EngineResult<Option<String>> {
        self.query_scalar(catalog::PRIMARY_KEY, &[&owner, &table]).await
    }

    async fn dependent_objects(&self, owner: &str, table: &str) -> EngineResult<Vec<DependentObject>> {
        let mut objects = Vec::new();

        for row in self.query(catalog::INDEXES, &[&owner, &table]).await? {
            let Some(name) = text(&row, 0)? else { continue };
            let unique = text(&row, 1)?.as_deref() == Some("UNIQUE");
            let definition = text(&row, 2)?.unwrap_or_default();
            let columns = self
                .query(catalog::INDEX_COLUMNS, &[&owner, &table, &name])
                .await?
                .iter()
                .map(|r| text(r, 0).map(Option::unwrap_or_default))
                .collect::<EngineResult<Vec<_>>>()?;
            objects.push(DependentObject {
                name,
                kind: ObjectKind::Index,
                definition: definition.trim().to_string(),
                columns,
                unique,
                backing_index: None,
            });
        }

        for row in self.query(catalog::CONSTRAINTS, &[&owner, &table]).await? {
            let Some(name) = text(&row, 0)? else { continue };
            let code = text(&row, 1)?.unwrap_or_default();
            let Some(kind) = ObjectKind::from_constraint_type(&code) else {
                debug!("재생성하지 않는 제약 조건 유형 {}: {}", code, name);
                continue;
            };
            let definition = text(&row, 2)?.unwrap_or_default();
            let backing_index = text(&row, 3)?;
            objects.push(DependentObject {
                name,
                kind,
                definition: definition.trim().to_string(),
                columns: Vec::new(),
                unique: matches!(kind, ObjectKind::PrimaryKey | ObjectKind::Unique),
                backing_index,
            });
        }

        debug!("{}: 종속 객체 {}개", quote(table), objects.len());
        Ok(objects)
    }

    async fn partitions(&self, owner: &str, table: &str) -> EngineResult<Vec<PartitionInfo>> {
        let rows = self.query(catalog::PARTITIONS, &[&owner, &table]).await?;
        let mut partitions = Vec::with_capacity(rows.len());
        for row in &rows {
            partitions.push(PartitionInfo {
                name: text(row, 0)?.unwrap_or_default(),
                high_value: text(row, 1)?.unwrap_or_default(),
                position: u32::try_from(number(text(row, 2)?)?).unwrap_or(0),
            });
        }
        Ok(partitions)
    }

    async fn date_range(
        &self,
        owner: &str,
        table: &str,
        column: &str,
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>> {
        let sql = catalog::date_range(&qualified(owner, table), &quote(column));
        let rows = self.query(&sql, &[]).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let min = parse_date(text(row, 0)?)?;
        let max = parse_date(text(row, 1)?)?;
        Ok(min.zip(max))
    }
}
