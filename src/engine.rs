// 대상 엔진 접근 인터페이스
// 구문 실행과 읽기 전용 카탈로그 조회만 노출합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// 원본 테이블 컬럼 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// 렌더링된 타입 (예: VARCHAR2(40 BYTE), NUMBER(10,2))
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// 종속 객체 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Index,
    PrimaryKey,
    Unique,
    Check,
    ForeignKey,
}

impl ObjectKind {
    pub fn is_constraint(&self) -> bool {
        !matches!(self, ObjectKind::Index)
    }

    /// 제약 조건 재생성 순서 - 기본 키, 고유/체크, 외래 키 순
    pub fn rebuild_rank(&self) -> u8 {
        match self {
            ObjectKind::Index => 0,
            ObjectKind::PrimaryKey => 1,
            ObjectKind::Unique | ObjectKind::Check => 2,
            ObjectKind::ForeignKey => 3,
        }
    }

    /// 제약 조건 유형 코드 (P, U, C, R)
    pub fn from_constraint_type(code: &str) -> Option<Self> {
        match code {
            "P" => Some(ObjectKind::PrimaryKey),
            "U" => Some(ObjectKind::Unique),
            "C" => Some(ObjectKind::Check),
            "R" => Some(ObjectKind::ForeignKey),
            _ => None,
        }
    }
}

/// 정의 추출 기능으로 얻은 종속 객체
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentObject {
    pub name: String,
    pub kind: ObjectKind,
    /// 엔진이 추출한 생성 구문
    pub definition: String,
    /// 인덱스 컬럼 (인덱스인 경우)
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    /// 기본 키/고유 제약 조건을 받치는 인덱스 이름
    #[serde(default)]
    pub backing_index: Option<String>,
}

impl DependentObject {
    /// 객체가 차지하는 인덱스 이름 (인덱스 자신 또는 제약 조건의 받침 인덱스)
    pub fn index_name(&self) -> Option<&str> {
        match self.kind {
            ObjectKind::Index => Some(&self.name),
            _ => self.backing_index.as_deref(),
        }
    }
}

/// 파티션 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub name: String,
    pub high_value: String,
    pub position: u32,
}

/// 대상 엔진
#[async_trait]
pub trait Engine: Send + Sync {
    /// 구문 실행 - 영향받은 행 수 반환
    async fn execute(&self, sql: &str) -> EngineResult<u64>;

    async fn table_exists(&self, owner: &str, table: &str) -> EngineResult<bool>;

    async fn columns(&self, owner: &str, table: &str) -> EngineResult<Vec<ColumnInfo>>;

    async fn row_count(&self, owner: &str, table: &str) -> EngineResult<i64>;

    /// 테이블 세그먼트 크기 (바이트)
    async fn segment_bytes(&self, owner: &str, table: &str) -> EngineResult<i64>;

    /// 기본 키 제약 조건 이름
    async fn primary_key(&self, owner: &str, table: &str) -> EngineResult<Option<String>>;

    /// 인덱스(제약 조건 소유 인덱스 제외)와 제약 조건 정의
    async fn dependent_objects(&self, owner: &str, table: &str) -> EngineResult<Vec<DependentObject>>;

    async fn partitions(&self, owner: &str, table: &str) -> EngineResult<Vec<PartitionInfo>>;

    /// 날짜 컬럼의 최소/최대 날짜
    async fn date_range(
        &self,
        owner: &str,
        table: &str,
        column: &str,
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>>;
}
