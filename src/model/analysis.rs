use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONVERSION_FORMAT, DEFAULT_NULL_REPLACEMENT};
use crate::ident::literal;

/// 파티션 키 NULL 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullStrategy {
    /// NULL 행은 기본/첫 파티션으로 들어감
    #[default]
    Allow,
    /// 마이그레이션 전에 대체 값으로 갱신
    Update,
}

/// 외부 분석기가 만든 분석 레코드 (읽기 전용)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub task_id: i64,
    #[serde(default)]
    pub recommended_strategy: Option<String>,
    #[serde(default)]
    pub date_column: Option<String>,
    /// 날짜 대체 컬럼의 원래 타입 (NUMBER, VARCHAR2 등)
    #[serde(default)]
    pub date_column_type: Option<String>,
    #[serde(default)]
    pub min_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_date: Option<NaiveDate>,
    #[serde(default)]
    pub requires_conversion: bool,
    #[serde(default)]
    pub conversion_format: Option<String>,
    #[serde(default)]
    pub null_strategy: NullStrategy,
    #[serde(default)]
    pub null_replacement: Option<String>,
    #[serde(default)]
    pub null_count: i64,
    #[serde(default)]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub blocking_issues: Vec<String>,
}

impl AnalysisRecord {
    pub fn is_blocked(&self) -> bool {
        !self.blocking_issues.is_empty()
    }

    /// 타입 변환 대상 컬럼 (변환이 필요한 경우만)
    pub fn conversion_column(&self) -> Option<&str> {
        if self.requires_conversion {
            self.date_column.as_deref()
        } else {
            None
        }
    }

    pub fn conversion_format(&self) -> &str {
        self.conversion_format
            .as_deref()
            .unwrap_or(DEFAULT_CONVERSION_FORMAT)
    }

    /// 파티션 키 NULL 대체 값 (원본 컬럼 타입 기준 SQL 표현식)
    ///
    /// 변환 대상 컬럼은 DATE 가 아니므로 기본 대체일을 변환 형식으로 렌더링합니다.
    pub fn null_replacement(&self) -> String {
        if let Some(value) = &self.null_replacement {
            return value.clone();
        }
        if !self.requires_conversion {
            return DEFAULT_NULL_REPLACEMENT.to_string();
        }

        let format = self.conversion_format();
        let numeric = self.is_numeric_source();
        match NaiveDate::from_ymd_opt(1900, 1, 1).and_then(|date| render_date(date, format)) {
            Some(text) if numeric && !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => text,
            Some(text) if !numeric => literal(&text),
            // 직접 렌더링할 수 없는 형식은 DB에 맡김
            _ => {
                let expr = format!("TO_CHAR({}, {})", DEFAULT_NULL_REPLACEMENT, literal(format));
                if numeric {
                    format!("TO_NUMBER({})", expr)
                } else {
                    expr
                }
            }
        }
    }

    fn is_numeric_source(&self) -> bool {
        let kind = self.date_column_type.as_deref().unwrap_or("").trim().to_ascii_uppercase();
        ["NUMBER", "INTEGER", "NUMERIC", "DECIMAL", "FLOAT", "INT", "SMALLINT"]
            .iter()
            .any(|t| kind == *t || kind.starts_with(&format!("{}(", t)))
    }

    /// 분석된 날짜 범위
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) => Some((min, max)),
            (Some(min), None) => Some((min, min)),
            (None, Some(max)) => Some((max, max)),
            (None, None) => None,
        }
    }
}

/// 날짜를 Oracle 형식 모델(YYYY, MM, DD, HH24, MI, SS)로 렌더링
///
/// 그 밖의 형식 요소가 있으면 None.
fn render_date(date: NaiveDate, format: &str) -> Option<String> {
    let format = format.to_ascii_uppercase();
    let mut rest = format.as_str();
    let mut out = String::new();

    while let Some(c) = rest.chars().next() {
        let (text, len) = if rest.starts_with("YYYY") {
            (format!("{:04}", date.year()), 4)
        } else if rest.starts_with("HH24") {
            ("00".to_string(), 4)
        } else if rest.starts_with("MM") {
            (format!("{:02}", date.month()), 2)
        } else if rest.starts_with("DD") {
            (format!("{:02}", date.day()), 2)
        } else if rest.starts_with("MI") || rest.starts_with("SS") {
            ("00".to_string(), 2)
        } else if c.is_ascii_alphanumeric() {
            return None;
        } else {
            (c.to_string(), c.len_utf8())
        };
        out.push_str(&text);
        rest = &rest[len..];
    }
    Some(out)
}
