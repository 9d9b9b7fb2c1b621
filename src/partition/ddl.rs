// 파티션 테이블 생성 구문 빌더
// 구조화된 절(컬럼, 파티션, 저장 속성)을 경계에서만 텍스트로 직렬화합니다.

use std::fmt::{self, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ident::{qualified, quote};
use super::interval::Granularity;

/// 세그먼트 압축 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compression {
    None,
    Basic,
    Advanced,
    QueryLow,
    QueryHigh,
    ArchiveLow,
    ArchiveHigh,
}

impl Compression {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase()
            .replace('_', " ");

        match normalized.as_str() {
            "NONE" | "NOCOMPRESS" | "OFF" => Some(Compression::None),
            "BASIC" | "COMPRESS" | "COMPRESS BASIC" => Some(Compression::Basic),
            "ADVANCED" | "OLTP" | "ROW STORE COMPRESS ADVANCED" => Some(Compression::Advanced),
            "QUERY LOW" | "COMPRESS FOR QUERY LOW" => Some(Compression::QueryLow),
            "QUERY HIGH" | "QUERY" | "COMPRESS FOR QUERY HIGH" => Some(Compression::QueryHigh),
            "ARCHIVE LOW" | "COMPRESS FOR ARCHIVE LOW" => Some(Compression::ArchiveLow),
            "ARCHIVE HIGH" | "ARCHIVE" | "COMPRESS FOR ARCHIVE HIGH" => Some(Compression::ArchiveHigh),
            _ => None,
        }
    }

    /// 구문에 들어갈 압축 절
    pub fn clause(&self) -> &'static str {
        match self {
            Compression::None => "NOCOMPRESS",
            Compression::Basic => "ROW STORE COMPRESS BASIC",
            Compression::Advanced => "ROW STORE COMPRESS ADVANCED",
            Compression::QueryLow => "COLUMN STORE COMPRESS FOR QUERY LOW",
            Compression::QueryHigh => "COLUMN STORE COMPRESS FOR QUERY HIGH",
            Compression::ArchiveLow => "COLUMN STORE COMPRESS FOR ARCHIVE LOW",
            Compression::ArchiveHigh => "COLUMN STORE COMPRESS FOR ARCHIVE HIGH",
        }
    }
}

/// 세그먼트 저장 속성
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageClause {
    pub tablespace: Option<String>,
    pub compression: Option<Compression>,
    pub pctfree: Option<u8>,
}

impl StorageClause {
    pub fn is_empty(&self) -> bool {
        self.tablespace.is_none() && self.compression.is_none() && self.pctfree.is_none()
    }

    /// 공백으로 구분된 저장 속성 (비어 있으면 빈 문자열)
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if let Some(tablespace) = &self.tablespace {
            parts.push(format!("TABLESPACE {}", quote(tablespace)));
        }
        if let Some(pctfree) = self.pctfree {
            parts.push(format!("PCTFREE {}", pctfree));
        }
        if let Some(compression) = self.compression {
            parts.push(compression.clause().to_string());
        }
        parts.join(" ")
    }
}

/// 컬럼 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// 범위 파티션 상한
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Date(NaiveDate),
    MaxValue,
}

impl RangeBound {
    pub fn render(&self) -> String {
        match self {
            RangeBound::Date(date) => format!("TO_DATE('{}', 'YYYY-MM-DD')", date.format("%Y-%m-%d")),
            RangeBound::MaxValue => "MAXVALUE".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePartition {
    pub name: String,
    pub upper: RangeBound,
    pub storage: StorageClause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPartition {
    pub name: String,
    /// 이미 렌더링된 리터럴 값
    pub values: Vec<String>,
}

/// 파티션 방식 절
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSpec {
    Range {
        key: String,
        interval: Option<Granularity>,
        partitions: Vec<RangePartition>,
    },
    List {
        key: String,
        automatic: bool,
        partitions: Vec<ListPartition>,
    },
    Hash {
        key: String,
        count: u32,
    },
}

impl PartitionSpec {
    pub fn key(&self) -> &str {
        match self {
            PartitionSpec::Range { key, .. }
            | PartitionSpec::List { key, .. }
            | PartitionSpec::Hash { key, .. } => key,
        }
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        match self {
            PartitionSpec::Range { key, interval, partitions } => {
                writeln!(out, "PARTITION BY RANGE ({})", quote(key))?;
                if let Some(granularity) = interval {
                    writeln!(out, "INTERVAL ({})", granularity.interval_expr())?;
                }
                let rendered: Vec<String> = partitions
                    .iter()
                    .map(|p| {
                        let storage = p.storage.render();
                        let mut line = format!(
                            "    PARTITION {} VALUES LESS THAN ({})",
                            quote(&p.name),
                            p.upper.render()
                        );
                        if !storage.is_empty() {
                            line.push(' ');
                            line.push_str(&storage);
                        }
                        line
                    })
                    .collect();
                write_partition_list(out, &rendered)
            }
            PartitionSpec::List { key, automatic, partitions } => {
                write!(out, "PARTITION BY LIST ({})", quote(key))?;
                if *automatic {
                    out.push_str(" AUTOMATIC");
                }
                out.push('\n');
                let rendered: Vec<String> = partitions
                    .iter()
                    .map(|p| format!("    PARTITION {} VALUES ({})", quote(&p.name), p.values.join(", ")))
                    .collect();
                write_partition_list(out, &rendered)
            }
            PartitionSpec::Hash { key, count } => {
                writeln!(out, "PARTITION BY HASH ({})", quote(key))?;
                writeln!(out, "PARTITIONS {}", count)
            }
        }
    }
}

fn write_partition_list(out: &mut String, rendered: &[String]) -> fmt::Result {
    if rendered.is_empty() {
        return Ok(());
    }
    writeln!(out, "(")?;
    writeln!(out, "{}", rendered.join(",\n"))?;
    writeln!(out, ")")
}

/// 파티션 테이블 생성 구문
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    pub owner: String,
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub storage: StorageClause,
    pub partitioning: PartitionSpec,
    pub row_movement: bool,
    pub parallel: Option<u32>,
}

impl CreateTableStatement {
    fn render(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "CREATE TABLE {} (", qualified(&self.owner, &self.table))?;
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| -> Result<String, fmt::Error> {
                let mut line = format!("    {} {}", quote(&c.name), c.data_type);
                if let Some(default) = &c.default {
                    write!(line, " DEFAULT {}", default.trim())?;
                }
                if !c.nullable {
                    line.push_str(" NOT NULL");
                }
                Ok(line)
            })
            .collect::<Result<_, fmt::Error>>()?;
        writeln!(out, "{}", columns.join(",\n"))?;
        writeln!(out, ")")?;

        let storage = self.storage.render();
        if !storage.is_empty() {
            writeln!(out, "{}", storage)?;
        }

        self.partitioning.write_to(&mut out)?;

        if let Some(degree) = self.parallel {
            writeln!(out, "PARALLEL {}", degree)?;
        }
        if self.row_movement {
            writeln!(out, "ENABLE ROW MOVEMENT")?;
        }
        Ok(out.trim_end().to_string())
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render()?)
    }
}
