// 시스템 생성 파티션 이름 변환

use std::collections::HashSet;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::constants::{LIST_NAME_MARKER, LIST_NAME_VALUES, SYSTEM_PARTITION_PREFIX};
use crate::context::ExecutionContext;
use crate::ident::{qualified, quote};
use crate::model::{PartitionType, StepStatus, StepType};
use super::interval::Granularity;

/// 파티션 상한 값으로 읽기 쉬운 이름 생성
///
/// 해석할 수 없거나 HASH 파티션이면 None (이름 유지).
pub fn resolve_partition_name(
    high_value: &str,
    partition_type: PartitionType,
    interval: Option<Granularity>,
    max_len: usize,
) -> Option<String> {
    match partition_type {
        PartitionType::Range => {
            let granularity = interval?;
            let upper = find_date(high_value)?;
            // 상한은 다음 기간 시작이므로 한 기간 되돌려 자기 기간 시작을 구함
            let period_start = granularity.floor(granularity.shift(upper, -1));
            let name = granularity.partition_name(period_start);
            Some(truncate(name, max_len))
        }
        PartitionType::List => list_name(high_value, max_len),
        PartitionType::Hash => None,
    }
}

/// 문자열 안의 첫 번째 YYYY-MM-DD 날짜
fn find_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    (0..=bytes.len() - 10).find_map(|i| {
        let window = &bytes[i..i + 10];
        let shaped = window.iter().enumerate().all(|(j, b)| match j {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shaped {
            return None;
        }
        std::str::from_utf8(window)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    })
}

fn list_name(high_value: &str, max_len: usize) -> Option<String> {
    let values = split_list_values(high_value);
    if values.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case("DEFAULT")) {
        return None;
    }

    let parts: Vec<String> = values
        .iter()
        .take(LIST_NAME_VALUES)
        .map(|v| sanitize(v))
        .filter(|v| !v.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let mut name = format!("P_{}", parts.join("_"));
    if values.len() > LIST_NAME_VALUES {
        name.push_str(LIST_NAME_MARKER);
    }
    Some(truncate(name, max_len))
}

/// 따옴표 밖의 쉼표로 값 분리
fn split_list_values(high_value: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = high_value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if quoted && chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
            }
            '\'' => quoted = !quoted,
            ',' if !quoted => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        values.push(current.trim().to_string());
    }
    values.retain(|v| !v.is_empty());
    values
}

fn sanitize(value: &str) -> String {
    let mapped: String = value
        .to_ascii_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    mapped.trim_matches('_').to_string()
}

fn truncate(name: String, max_len: usize) -> String {
    if name.len() <= max_len {
        name
    } else {
        name.chars().take(max_len).collect::<String>().trim_end_matches('_').to_string()
    }
}

/// 컷오버 후 SYS_P 파티션 이름 변경 - 변경된 파티션 수 반환
///
/// 이름 변경은 부가 작업이므로 실패는 경고로만 남깁니다.
pub async fn rename_system_partitions(
    ctx: &ExecutionContext,
    owner: &str,
    table: &str,
    partition_type: PartitionType,
    interval: Option<Granularity>,
    max_len: usize,
) -> usize {
    if partition_type == PartitionType::Hash {
        return 0;
    }
    if ctx.is_simulate() {
        ctx.note("RENAME_PARTITIONS", StepType::Rename, StepStatus::Skipped, Some("모의 실행".to_string()))
            .await;
        return 0;
    }

    let partitions = match ctx.engine().partitions(owner, table).await {
        Ok(partitions) => partitions,
        Err(e) => {
            warn!("파티션 목록 조회 실패 {}.{}: {}", owner, table, e);
            return 0;
        }
    };

    let mut taken: HashSet<String> = partitions.iter().map(|p| p.name.clone()).collect();
    let mut renamed = 0;

    for partition in partitions.iter().filter(|p| p.name.starts_with(SYSTEM_PARTITION_PREFIX)) {
        let Some(name) = resolve_partition_name(&partition.high_value, partition_type, interval, max_len) else {
            debug!("파티션 이름 유지: {} ({})", partition.name, partition.high_value);
            continue;
        };
        if taken.contains(&name) {
            debug!("이미 존재하는 파티션 이름 {} - {} 유지", name, partition.name);
            continue;
        }

        let sql = format!(
            "ALTER TABLE {} RENAME PARTITION {} TO {}",
            qualified(owner, table),
            quote(&partition.name),
            quote(&name)
        );
        if ctx.execute_tolerant("RENAME_PARTITION", StepType::Rename, &sql).await {
            taken.remove(&partition.name);
            taken.insert(name);
            renamed += 1;
        }
    }

    if renamed > 0 {
        info!("{}.{} 파티션 {} 개 이름 변경", owner, table, renamed);
    }
    renamed
}
