// 마이그레이션 오류 정의

use thiserror::Error;

/// 권한 부족으로 분류되는 엔진 오류 코드
const PRIVILEGE_CODES: [&str; 2] = ["42501", "ORA-01031"];

/// 기능 미지원으로 분류되는 엔진 오류 코드
const UNSUPPORTED_CODES: [&str; 6] = [
    "0A000",
    "ORA-12089", // 기본 키 없는 테이블 온라인 재구성 불가
    "ORA-12090", // 온라인 재구성 불가 테이블
    "ORA-42016", // 재구성 중 컬럼 매핑 불가
    "ORA-12087", // SYS/SYSTEM 소유 테이블
    "ORA-23549", // 재구성 미지원 컬럼 타입
];

/// 엔진(대상 데이터베이스) 호출 오류
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("지원되지 않는 작업 ({code}): {message}")]
    Unsupported { code: String, message: String },
    #[error("권한 부족 ({code}): {message}")]
    InsufficientPrivilege { code: String, message: String },
    #[error("{message}")]
    Failed { code: Option<String>, message: String },
}

impl EngineError {
    /// 엔진 오류 코드와 메시지로 오류 유형 분류
    ///
    /// 코드가 없으면 메시지 안의 `ORA-nnnnn` 표기를 찾아 사용합니다.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        let code = code
            .map(|c| c.to_string())
            .or_else(|| find_ora_code(message));

        match code {
            Some(code) if PRIVILEGE_CODES.contains(&code.as_str()) => Self::InsufficientPrivilege {
                code,
                message: message.to_string(),
            },
            Some(code) if UNSUPPORTED_CODES.contains(&code.as_str()) => Self::Unsupported {
                code,
                message: message.to_string(),
            },
            code => Self::Failed {
                code,
                message: message.to_string(),
            },
        }
    }

    /// 코드 없는 일반 실패
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            code: None,
            message: message.into(),
        }
    }

    /// 대체 전략으로 넘어가도 되는 오류인지 여부
    pub fn permits_fallback(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::InsufficientPrivilege { .. })
    }
}

/// 메시지에서 첫 번째 ORA 오류 코드 추출
fn find_ora_code(message: &str) -> Option<String> {
    let idx = message.find("ORA-")?;
    let digits: String = message[idx + 4..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() == 5 {
        Some(format!("ORA-{}", digits))
    } else {
        None
    }
}

/// 마이그레이션 오류
#[derive(Debug, Error)]
pub enum MigrationError {
    /// 잘못된 입력 (템플릿, 파티션 유형, 날짜 컬럼 등) - 변경 전에 발생
    #[error("검증 오류: {0}")]
    Validation(String),
    /// 전략 수행 불가 (대체 전략 사용)
    #[error("기능 제약: {0}")]
    Capability(String),
    /// DDL/데이터 이동 단계 실패
    #[error("실행 오류 [{step}]: {message}")]
    Execution {
        step: String,
        statement: Option<String>,
        message: String,
    },
    /// 마이그레이션 후 무결성 검증 실패
    #[error("무결성 오류: {0}")]
    Integrity(String),
    /// 작업 저장소 오류
    #[error("저장소 오류: {0}")]
    Store(String),
    /// 설정 오류
    #[error("설정 오류: {0}")]
    Config(String),
}

impl MigrationError {
    /// 실패한 구문 (있다면)
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Execution { statement, .. } => statement.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

/// 검증 오류 생성
pub fn validation_err(message: impl Into<String>) -> MigrationError {
    MigrationError::Validation(message.into())
}

/// 실행 오류 생성
pub fn execution_err(
    step: impl Into<String>,
    statement: Option<String>,
    message: impl Into<String>,
) -> MigrationError {
    MigrationError::Execution {
        step: step.into(),
        statement,
        message: message.into(),
    }
}

/// 저장소 오류 생성
pub fn store_err(message: impl Into<String>) -> MigrationError {
    MigrationError::Store(message.into())
}

impl From<EngineError> for MigrationError {
    fn from(e: EngineError) -> Self {
        execution_err("ENGINE", None, e.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(e: std::io::Error) -> Self {
        MigrationError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for MigrationError {
    fn from(e: serde_yaml::Error) -> Self {
        MigrationError::Config(e.to_string())
    }
}
