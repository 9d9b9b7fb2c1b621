// 식별자 처리 유틸리티

/// 인용 부호로 감싼 식별자
pub fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 소유자를 포함한 인용 식별자 ("OWNER"."TABLE")
pub fn qualified(owner: &str, name: &str) -> String {
    format!("{}.{}", quote(owner), quote(name))
}

/// 접미사를 붙인 이름 생성 - 길이 제한을 넘으면 원래 이름을 잘라냄
pub fn suffixed(name: &str, suffix: &str, max_len: usize) -> String {
    let keep = max_len.saturating_sub(suffix.len());
    let base: String = name.chars().take(keep).collect();
    format!("{}{}", base, suffix)
}

/// 접미사 제거 (없으면 None)
pub fn strip_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|base| !base.is_empty())
}

/// SQL 문자열 리터럴
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
