use std::fmt;
use std::path::Path;

use chrono::{Days, Months, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{validation_err, Result};
use crate::partition::ddl::{Compression, StorageClause};
use crate::partition::interval::Granularity;

/// 저장 계층
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "HOT",
            Tier::Warm => "WARM",
            Tier::Cold => "COLD",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 계층 나이 기준 (일 또는 월, 둘 중 하나)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierAge {
    Days(u32),
    Months(u32),
}

impl TierAge {
    /// 기준일 = now - age
    pub fn cutoff(&self, now: NaiveDate) -> NaiveDate {
        match *self {
            TierAge::Days(days) => now
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            TierAge::Months(months) => now
                .checked_sub_months(Months::new(months))
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// 대략적인 일 수 (월 = 30일)
    pub fn approx_days(&self) -> u32 {
        match *self {
            TierAge::Days(days) => days,
            TierAge::Months(months) => months.saturating_mul(30),
        }
    }
}

impl fmt::Display for TierAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierAge::Days(days) => write!(f, "{} DAYS", days),
            TierAge::Months(months) => write!(f, "{} MONTHS", months),
        }
    }
}

/// 검증된 계층 설정
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSettings {
    pub tier: Tier,
    pub age: TierAge,
    pub granularity: Granularity,
    pub tablespace: String,
    pub compression: Compression,
    pub pctfree: Option<u8>,
}

impl TierSettings {
    /// 이 계층의 저장 속성
    pub fn storage(&self) -> StorageClause {
        StorageClause {
            tablespace: Some(self.tablespace.clone()),
            compression: Some(self.compression),
            pctfree: self.pctfree,
        }
    }
}

/// 검증된 계층 템플릿
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierTemplate {
    pub name: String,
    pub hot: TierSettings,
    pub warm: TierSettings,
    pub cold: TierSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawTier {
    interval: Option<String>,
    tablespace: Option<String>,
    compression: Option<String>,
    age_days: Option<u32>,
    age_months: Option<u32>,
    pctfree: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTemplate {
    name: Option<String>,
    hot: Option<RawTier>,
    warm: Option<RawTier>,
    cold: Option<RawTier>,
}

impl TierTemplate {
    /// 템플릿 문서 (YAML 또는 JSON) 파싱 및 검증
    ///
    /// 누락/오류 필드를 모두 모아 하나의 검증 오류로 반환합니다.
    pub fn parse(name: &str, document: &str) -> Result<Self> {
        let raw: RawTemplate = serde_yaml::from_str(document)
            .map_err(|e| validation_err(format!("템플릿 {} 형식 오류: {}", name, e)))?;
        let name = raw.name.clone().unwrap_or_else(|| name.to_string());

        let mut problems = Vec::new();
        let hot = validate_tier(Tier::Hot, raw.hot.as_ref(), &mut problems);
        let warm = validate_tier(Tier::Warm, raw.warm.as_ref(), &mut problems);
        let cold = validate_tier(Tier::Cold, raw.cold.as_ref(), &mut problems);

        match (hot, warm, cold) {
            (Some(hot), Some(warm), Some(cold)) if problems.is_empty() => {
                debug!("계층 템플릿 검증 완료: {}", name);
                Ok(Self { name, hot, warm, cold })
            }
            _ => Err(validation_err(format!(
                "계층 템플릿 {} 검증 실패: {}",
                name,
                problems.join("; ")
            ))),
        }
    }

    /// 파일에서 템플릿 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "template".to_string());
        Self::parse(&name, &contents)
    }

    pub fn tier(&self, tier: Tier) -> &TierSettings {
        match tier {
            Tier::Hot => &self.hot,
            Tier::Warm => &self.warm,
            Tier::Cold => &self.cold,
        }
    }
}

fn validate_tier(tier: Tier, raw: Option<&RawTier>, problems: &mut Vec<String>) -> Option<TierSettings> {
    let key = tier.key();
    let raw = match raw {
        Some(raw) => raw,
        None => {
            problems.push(format!("{} 계층이 없습니다", key));
            return None;
        }
    };

    let granularity = match raw.interval.as_deref() {
        None => {
            problems.push(format!("{}.interval 필드가 필요합니다", key));
            None
        }
        Some(value) => match Granularity::parse(value) {
            Some(g) => Some(g),
            None => {
                problems.push(format!("{}.interval 값을 해석할 수 없습니다: {}", key, value));
                None
            }
        },
    };

    let tablespace = match raw.tablespace.as_deref().map(str::trim) {
        Some(ts) if !ts.is_empty() => Some(ts.to_ascii_uppercase()),
        _ => {
            problems.push(format!("{}.tablespace 필드가 필요합니다", key));
            None
        }
    };

    let compression = match raw.compression.as_deref() {
        None => {
            problems.push(format!("{}.compression 필드가 필요합니다", key));
            None
        }
        Some(value) => match Compression::parse(value) {
            Some(c) => Some(c),
            None => {
                problems.push(format!("{}.compression 값을 해석할 수 없습니다: {}", key, value));
                None
            }
        },
    };

    let age = match (raw.age_days, raw.age_months) {
        (Some(days), None) => Some(TierAge::Days(days)),
        (None, Some(months)) => Some(TierAge::Months(months)),
        (Some(_), Some(_)) => {
            problems.push(format!("{}.age_days 와 {}.age_months 는 함께 쓸 수 없습니다", key, key));
            None
        }
        (None, None) => {
            problems.push(format!("{}.age_days 또는 {}.age_months 필드가 필요합니다", key, key));
            None
        }
    };

    if let Some(pctfree) = raw.pctfree {
        if pctfree > 99 {
            problems.push(format!("{}.pctfree 는 0-99 범위여야 합니다", key));
        }
    }

    Some(TierSettings {
        tier,
        age: age?,
        granularity: granularity?,
        tablespace: tablespace?,
        compression: compression?,
        pctfree: raw.pctfree,
    })
}
