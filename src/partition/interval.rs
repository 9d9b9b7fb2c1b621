use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// 파티션 간격 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    /// 간격 표기 파싱 - 키워드(MONTHLY) 또는 간격 식(NUMTOYMINTERVAL(1,'MONTH'))
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "DAILY" | "DAY" | "NUMTODSINTERVAL(1,DAY)" => Some(Granularity::Daily),
            "WEEKLY" | "WEEK" | "NUMTODSINTERVAL(7,DAY)" => Some(Granularity::Weekly),
            "MONTHLY" | "MONTH" | "NUMTOYMINTERVAL(1,MONTH)" => Some(Granularity::Monthly),
            "QUARTERLY" | "QUARTER" | "NUMTOYMINTERVAL(3,MONTH)" => Some(Granularity::Quarterly),
            "YEARLY" | "YEAR" | "NUMTOYMINTERVAL(1,YEAR)" | "NUMTOYMINTERVAL(12,MONTH)" => {
                Some(Granularity::Yearly)
            }
            _ => None,
        }
    }

    /// INTERVAL 절에 들어갈 간격 식
    pub fn interval_expr(&self) -> &'static str {
        match self {
            Granularity::Daily => "NUMTODSINTERVAL(1, 'DAY')",
            Granularity::Weekly => "NUMTODSINTERVAL(7, 'DAY')",
            Granularity::Monthly => "NUMTOYMINTERVAL(1, 'MONTH')",
            Granularity::Quarterly => "NUMTOYMINTERVAL(3, 'MONTH')",
            Granularity::Yearly => "NUMTOYMINTERVAL(1, 'YEAR')",
        }
    }

    /// 해당 날짜가 속한 기간의 시작일
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        let floored = match self {
            Granularity::Daily => Some(date),
            Granularity::Weekly => {
                date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            }
            Granularity::Monthly => date.with_day(1),
            Granularity::Quarterly => {
                let month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1)
            }
            Granularity::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        floored.unwrap_or(date)
    }

    /// 기간 단위로 이동 (음수는 과거)
    pub fn shift(&self, date: NaiveDate, periods: i32) -> NaiveDate {
        let magnitude = periods.unsigned_abs();
        let shifted = match self {
            Granularity::Daily | Granularity::Weekly => {
                let days = Days::new(u64::from(magnitude) * self.days_per_period());
                if periods >= 0 {
                    date.checked_add_days(days)
                } else {
                    date.checked_sub_days(days)
                }
            }
            Granularity::Monthly | Granularity::Quarterly | Granularity::Yearly => {
                let months = Months::new(magnitude.saturating_mul(self.months_per_period()));
                if periods >= 0 {
                    date.checked_add_months(months)
                } else {
                    date.checked_sub_months(months)
                }
            }
        };
        shifted.unwrap_or(if periods >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
    }

    /// 날짜 이후의 다음 기간 시작일 (항상 date보다 큼)
    pub fn next_boundary(&self, date: NaiveDate) -> NaiveDate {
        self.shift(self.floor(date), 1)
    }

    /// 기간 시작일 기준 파티션 이름
    pub fn partition_name(&self, period_start: NaiveDate) -> String {
        match self {
            Granularity::Daily | Granularity::Weekly => {
                format!("P_{}", period_start.format("%Y%m%d"))
            }
            Granularity::Monthly => format!("P_{}", period_start.format("%Y%m")),
            Granularity::Quarterly => {
                format!("P_{}Q{}", period_start.year(), period_start.month0() / 3 + 1)
            }
            Granularity::Yearly => format!("P_{}", period_start.year()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Weekly => "WEEKLY",
            Granularity::Monthly => "MONTHLY",
            Granularity::Quarterly => "QUARTERLY",
            Granularity::Yearly => "YEARLY",
        }
    }

    fn days_per_period(&self) -> u64 {
        match self {
            Granularity::Weekly => 7,
            _ => 1,
        }
    }

    fn months_per_period(&self) -> u32 {
        match self {
            Granularity::Quarterly => 3,
            Granularity::Yearly => 12,
            _ => 1,
        }
    }
}
