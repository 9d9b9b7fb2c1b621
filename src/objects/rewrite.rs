// 추출된 객체 정의 안의 이름 치환
// 문자열 리터럴은 건드리지 않고 식별자 토큰만 바꿉니다.

use std::collections::HashMap;

use crate::ident::quote;

/// 식별자 치환 목록 (대문자 이름 기준)
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: HashMap<String, String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: impl Into<String>) {
        self.entries.insert(from.to_string(), to.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

/// 정의 안의 테이블/객체/컬럼 이름 치환
///
/// 인용 식별자는 정확히 일치할 때, 인용 없는 식별자는 대문자로 비교해 치환합니다.
/// 치환된 이름은 항상 인용 식별자로 출력됩니다.
pub fn rewrite_definition(definition: &str, names: &NameMap) -> String {
    let chars: Vec<char> = definition.chars().collect();
    let mut out = String::with_capacity(definition.len() + 32);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' => {
                // 문자열 리터럴 ('' 이스케이프 포함) 그대로 복사
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            out.push('\'');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '"' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '"' {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                match names.get(&name) {
                    Some(renamed) => out.push_str(&quote(renamed)),
                    None => {
                        out.push('"');
                        out.push_str(&name);
                        if end < chars.len() {
                            out.push('"');
                        }
                    }
                }
                i = end + 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match names.get(&word.to_ascii_uppercase()) {
                    Some(renamed) => out.push_str(&quote(renamed)),
                    None => out.push_str(&word),
                }
            }
            c if c.is_ascii_digit() => {
                // 숫자로 시작하는 토큰은 식별자가 아님
                while i < chars.len() && is_ident_char(chars[i]) {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.trim_end().trim_end_matches(';').trim_end().to_string()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#'
}

/// 인덱스 정의에 LOCAL 지정 추가
///
/// 이미 LOCAL/GLOBAL이 있으면 그대로 둡니다. 반환값이 None이면 LOCAL로 만들 수 없는 정의입니다.
pub fn make_local(definition: &str) -> Option<String> {
    if has_keyword(definition, "LOCAL") || has_keyword(definition, "GLOBAL") {
        return Some(definition.to_string());
    }

    let open = find_outside_literals(definition, '(')?;
    let mut depth = 0usize;
    let mut in_literal = false;
    for (offset, c) in definition[open..].char_indices() {
        match c {
            '\'' => in_literal = !in_literal,
            '(' if !in_literal => depth += 1,
            ')' if !in_literal => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let at = open + offset + 1;
                    let mut result = String::with_capacity(definition.len() + 6);
                    result.push_str(&definition[..at]);
                    result.push_str(" LOCAL");
                    result.push_str(&definition[at..]);
                    return Some(result);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_outside_literals(text: &str, target: char) -> Option<usize> {
    let mut in_literal = false;
    let mut in_quoted = false;
    for (idx, c) in text.char_indices() {
        match c {
            '\'' if !in_quoted => in_literal = !in_literal,
            '"' if !in_literal => in_quoted = !in_quoted,
            c if c == target && !in_literal && !in_quoted => return Some(idx),
            _ => {}
        }
    }
    None
}

/// 리터럴/인용 식별자 밖에 키워드가 있는지 확인
fn has_keyword(text: &str, keyword: &str) -> bool {
    let mut in_literal = false;
    let mut in_quoted = false;
    let mut word = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        match c {
            '\'' if !in_quoted => {
                in_literal = !in_literal;
                word.clear();
            }
            '"' if !in_literal => {
                in_quoted = !in_quoted;
                word.clear();
            }
            c if !in_literal && !in_quoted && is_ident_char(c) => word.push(c),
            _ => {
                if word.eq_ignore_ascii_case(keyword) {
                    return true;
                }
                word.clear();
            }
        }
    }
    false
}
