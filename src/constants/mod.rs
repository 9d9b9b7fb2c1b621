// SQL 쿼리 및 상수 모듈
pub mod catalog;
pub mod control;

// 객체 이름 접미사
pub const MIGR_SUFFIX: &str = "_MIGR";           // 컷오버 전 새 테이블/객체
pub const OLD_SUFFIX: &str = "_OLD";             // 컷오버 후 원본 테이블/객체
pub const EMPTY_SUFFIX: &str = "_EMPTY";         // 교환 후 비워진 원본 테이블
pub const BACKUP_SUFFIX: &str = "_BAK";          // 전체 백업 사본
pub const SWAP_SUFFIX: &str = "_SWAP";           // 온라인 재구성 이름 교환용 임시 이름
pub const CONVERTED_SUFFIX: &str = "_CONVERTED"; // 타입 변환된 컬럼

// 파티션 이름
pub const INITIAL_PARTITION: &str = "P_INITIAL";
pub const MAXVALUE_PARTITION: &str = "P_MAX";
pub const NULL_PARTITION: &str = "P_NULL";
pub const SYSTEM_PARTITION_PREFIX: &str = "SYS_P";
pub const LIST_NAME_MARKER: &str = "_ETC";       // 리스트 값이 더 있을 때 붙는 표시
pub const LIST_NAME_VALUES: usize = 3;           // 이름에 사용할 리스트 값 개수

// 기본값
pub const DEFAULT_BUFFER_PERIODS: u32 = 1;
pub const DEFAULT_HASH_PARTITIONS: u32 = 16;
pub const DEFAULT_ONLINE_MIN_ROWS: i64 = 1_000_000;
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 128;
pub const DEFAULT_CONVERSION_FORMAT: &str = "YYYYMMDD";
pub const DEFAULT_NULL_REPLACEMENT: &str = "DATE '1900-01-01'";
