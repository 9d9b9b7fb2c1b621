use chrono::NaiveDate;
use log::debug;

use crate::error::{validation_err, Result};
use crate::model::{Tier, TierAge, TierSettings};
use super::interval::Granularity;

/// 경계 계산에 쓰이는 계층 정보
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierWindow {
    pub tier: Tier,
    /// 없으면 인접 계층 기준일을 사용 (영구 보존)
    pub age: Option<TierAge>,
    pub granularity: Granularity,
}

impl From<&TierSettings> for TierWindow {
    fn from(settings: &TierSettings) -> Self {
        Self {
            tier: settings.tier,
            age: Some(settings.age),
            granularity: settings.granularity,
        }
    }
}

/// 경계 계산 입력
#[derive(Debug, Clone)]
pub struct BoundaryInput {
    pub source_min: Option<NaiveDate>,
    pub source_max: Option<NaiveDate>,
    pub now: NaiveDate,
    pub hot: TierWindow,
    pub warm: TierWindow,
    pub cold: TierWindow,
}

/// 계층별 기준일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCutoffs {
    pub hot: NaiveDate,
    pub warm: NaiveDate,
    pub cold: NaiveDate,
}

/// 파티션 하나의 범위 [lower, upper)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionBoundary {
    pub tier: Tier,
    pub name: String,
    pub lower: NaiveDate,
    pub upper: NaiveDate,
}

/// 계층별 파티션 경계 계산 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierBoundaries {
    pub cutoffs: TierCutoffs,
    pub partitions: Vec<PartitionBoundary>,
}

impl TierBoundaries {
    pub fn for_tier(&self, tier: Tier) -> impl Iterator<Item = &PartitionBoundary> {
        self.partitions.iter().filter(move |p| p.tier == tier)
    }

    /// 마지막 명시적 경계 (INTERVAL 전환점)
    pub fn transition_point(&self) -> Option<NaiveDate> {
        self.partitions.last().map(|p| p.upper)
    }
}

/// 계층 기준일 계산
///
/// cold <= warm <= hot <= now 를 만족하지 않으면 검증 오류.
pub fn tier_cutoffs(input: &BoundaryInput) -> Result<TierCutoffs> {
    let now = input.now;
    let hot = input.hot.age.map(|age| age.cutoff(now)).unwrap_or(now);
    let warm = input.warm.age.map(|age| age.cutoff(now)).unwrap_or(hot);
    let cold = input.cold.age.map(|age| age.cutoff(now)).unwrap_or(warm);

    if hot > now {
        return Err(validation_err(format!("HOT 기준일 {} 이 현재 {} 보다 늦습니다", hot, now)));
    }
    if warm > hot {
        return Err(validation_err(format!(
            "WARM 기준일 {} 이 HOT 기준일 {} 보다 늦습니다 (WARM 나이가 HOT 보다 작음)",
            warm, hot
        )));
    }
    if cold > warm {
        return Err(validation_err(format!(
            "COLD 기준일 {} 이 WARM 기준일 {} 보다 늦습니다 (COLD 나이가 WARM 보다 작음)",
            cold, warm
        )));
    }

    Ok(TierCutoffs { hot, warm, cold })
}

/// 계층형 파티션 경계 계산
///
/// COLD 파티션은 데이터 시작부터 WARM 기준일까지, WARM 파티션은 HOT 기준일까지,
/// HOT 파티션은 현재 날짜를 포함하는 파티션까지 생성됩니다. 이후 파티션은 엔진의
/// INTERVAL 파티셔닝이 생성합니다.
pub fn calculate_tiered(input: &BoundaryInput) -> Result<TierBoundaries> {
    let cutoffs = tier_cutoffs(input)?;
    let now = input.now;
    let source_min = input.source_min.unwrap_or(now).min(now);

    let mut partitions = Vec::new();
    let mut cursor: Option<NaiveDate> = None;

    for (window, tier_end) in [(&input.cold, cutoffs.warm), (&input.warm, cutoffs.hot)] {
        // 데이터가 이 계층보다 새로우면 명시적 파티션 없음
        if cursor.is_none() && source_min >= tier_end {
            debug!("{} 계층: 원본 시작일 {} >= 기준일 {}, 파티션 없음", window.tier, source_min, tier_end);
            continue;
        }
        let start = cursor.unwrap_or_else(|| window.granularity.floor(source_min));
        if start < tier_end {
            push_segment(&mut partitions, window, start, |cur| cur < tier_end, Some(tier_end));
            cursor = Some(tier_end);
        }
    }

    // HOT: 현재 날짜를 포함하는 파티션까지
    let hot = &input.hot;
    let start = cursor.unwrap_or_else(|| hot.granularity.floor(source_min));
    push_segment(&mut partitions, hot, start, |cur| cur <= now, None);

    debug!(
        "계층 경계 계산 완료: 파티션 {} 개 (cold {}, warm {}, hot {})",
        partitions.len(),
        cutoffs.cold,
        cutoffs.warm,
        cutoffs.hot
    );

    Ok(TierBoundaries { cutoffs, partitions })
}

/// 구간을 간격 단위로 잘라 파티션 추가 - 기준일을 넘으면 부분 기간 파티션으로 자름
fn push_segment<F>(
    partitions: &mut Vec<PartitionBoundary>,
    window: &TierWindow,
    start: NaiveDate,
    keep_going: F,
    clamp: Option<NaiveDate>,
) where
    F: Fn(NaiveDate) -> bool,
{
    let granularity = window.granularity;
    let mut cur = start;
    while keep_going(cur) {
        let mut upper = granularity.next_boundary(cur);
        if let Some(limit) = clamp {
            upper = upper.min(limit);
        }
        if upper <= cur {
            break;
        }

        let period_start = granularity.floor(cur);
        let mut name = granularity.partition_name(period_start);
        if period_start != cur {
            // 기준일에서 시작하는 부분 기간 파티션
            name = format!("{}_{}", name, window.tier.as_str());
        }

        partitions.push(PartitionBoundary {
            tier: window.tier,
            name,
            lower: cur,
            upper,
        });
        cur = upper;
    }
}

/// 균일 레이아웃의 첫 경계 = floor(source_min) - buffer 기간
pub fn uniform_lower_boundary(source_min: NaiveDate, granularity: Granularity, buffer_periods: u32) -> NaiveDate {
    let periods = i32::try_from(buffer_periods).unwrap_or(i32::MAX);
    granularity.shift(granularity.floor(source_min), -periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(tier: Tier, age: Option<TierAge>, granularity: Granularity) -> TierWindow {
        TierWindow { tier, age, granularity }
    }

    fn input(source_min: Option<NaiveDate>, now: NaiveDate) -> BoundaryInput {
        BoundaryInput {
            source_min,
            source_max: Some(now),
            now,
            hot: window(Tier::Hot, Some(TierAge::Months(3)), Granularity::Monthly),
            warm: window(Tier::Warm, Some(TierAge::Months(12)), Granularity::Quarterly),
            cold: window(Tier::Cold, Some(TierAge::Months(60)), Granularity::Yearly),
        }
    }

    #[test]
    fn uniform_boundary_truncates_and_buffers() {
        assert_eq!(uniform_lower_boundary(d(2019, 3, 15), Granularity::Monthly, 1), d(2019, 2, 1));
        assert_eq!(uniform_lower_boundary(d(2019, 3, 15), Granularity::Yearly, 0), d(2019, 1, 1));
        assert_eq!(uniform_lower_boundary(d(2019, 3, 15), Granularity::Daily, 2), d(2019, 3, 13));
    }

    #[test]
    fn cutoffs_are_monotonic() {
        let now = d(2024, 6, 15);
        let cutoffs = tier_cutoffs(&input(Some(d(2015, 1, 1)), now)).unwrap();
        assert!(cutoffs.cold <= cutoffs.warm);
        assert!(cutoffs.warm <= cutoffs.hot);
        assert!(cutoffs.hot <= now);
        assert_eq!(cutoffs.hot, d(2024, 3, 15));
        assert_eq!(cutoffs.warm, d(2023, 6, 15));
    }

    #[test]
    fn inverted_ages_are_rejected() {
        let mut bad = input(None, d(2024, 6, 15));
        bad.warm.age = Some(TierAge::Months(1));
        assert!(tier_cutoffs(&bad).is_err());
    }

    #[test]
    fn partitions_are_contiguous_and_cover_now() {
        let now = d(2024, 6, 15);
        let result = calculate_tiered(&input(Some(d(2020, 5, 20)), now)).unwrap();
        let parts = &result.partitions;

        assert_eq!(parts.first().unwrap().lower, d(2020, 1, 1));
        for pair in parts.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower, "{:?}", pair);
        }
        let last = parts.last().unwrap();
        assert_eq!(last.tier, Tier::Hot);
        assert!(last.lower <= now && now < last.upper);
        assert_eq!(result.transition_point(), Some(d(2024, 7, 1)));

        // 계층 경계에서 부분 기간 파티션
        let cold_last = result.for_tier(Tier::Cold).last().unwrap();
        assert_eq!(cold_last.upper, result.cutoffs.warm);
        let warm_first = result.for_tier(Tier::Warm).next().unwrap();
        assert_eq!(warm_first.lower, d(2023, 6, 15));
        assert_eq!(warm_first.upper, d(2023, 7, 1));
        assert_eq!(warm_first.name, "P_2023Q2_WARM");
    }

    #[test]
    fn names_are_unique() {
        let now = d(2024, 6, 15);
        let mut same = input(Some(d(2022, 1, 1)), now);
        same.warm.granularity = Granularity::Monthly;
        same.cold.granularity = Granularity::Monthly;
        let result = calculate_tiered(&same).unwrap();
        let mut names: Vec<_> = result.partitions.iter().map(|p| p.name.clone()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn recent_data_skips_older_tiers() {
        let now = d(2024, 6, 15);
        let result = calculate_tiered(&input(Some(d(2024, 5, 2)), now)).unwrap();
        assert_eq!(result.for_tier(Tier::Cold).count(), 0);
        assert_eq!(result.for_tier(Tier::Warm).count(), 0);
        let hot: Vec<_> = result.for_tier(Tier::Hot).collect();
        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].lower, d(2024, 5, 1));
        assert_eq!(hot[1].upper, d(2024, 7, 1));
    }

    #[test]
    fn missing_ages_collapse_to_adjacent_tier() {
        let now = d(2024, 6, 15);
        let mut permanent = input(Some(d(2023, 1, 1)), now);
        permanent.cold.age = None;
        permanent.warm.age = None;
        let result = calculate_tiered(&permanent).unwrap();
        assert_eq!(result.cutoffs.warm, result.cutoffs.hot);
        assert_eq!(result.cutoffs.cold, result.cutoffs.warm);
        assert_eq!(result.for_tier(Tier::Warm).count(), 0);
        assert!(result.for_tier(Tier::Cold).count() > 0);
    }
}
