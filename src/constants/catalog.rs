/// 대상 엔진 데이터 사전 조회 쿼리
/// 모든 숫자 값은 문자열로 받아 엔진별 숫자 타입 매핑 차이를 피합니다.
/// 매개변수: $1 = 소유자, $2 = 테이블

/// 테이블 존재 여부
pub const TABLE_EXISTS: &str = "
    SELECT TO_CHAR(COUNT(*))
    FROM ALL_TABLES
    WHERE OWNER = $1 AND TABLE_NAME = $2";

/// 컬럼 목록 (정의 순서)
pub const COLUMNS: &str = "
    SELECT COLUMN_NAME,
           DATA_TYPE,
           TO_CHAR(DATA_LENGTH),
           TO_CHAR(DATA_PRECISION),
           TO_CHAR(DATA_SCALE),
           CHAR_USED,
           NULLABLE,
           DATA_DEFAULT
    FROM ALL_TAB_COLUMNS
    WHERE OWNER = $1 AND TABLE_NAME = $2
    ORDER BY COLUMN_ID";

/// 테이블 세그먼트 크기 (파티션 세그먼트 포함)
pub const SEGMENT_BYTES: &str = "
    SELECT TO_CHAR(NVL(SUM(BYTES), 0))
    FROM ALL_SEGMENTS
    WHERE OWNER = $1 AND SEGMENT_NAME = $2
      AND SEGMENT_TYPE IN ('TABLE', 'TABLE PARTITION', 'TABLE SUBPARTITION')";

/// 기본 키 제약 조건 이름
pub const PRIMARY_KEY: &str = "
    SELECT CONSTRAINT_NAME
    FROM ALL_CONSTRAINTS
    WHERE OWNER = $1 AND TABLE_NAME = $2 AND CONSTRAINT_TYPE = 'P'";

/// 독립 인덱스 정의 - 제약 조건이 소유한 인덱스는 제약 조건과 함께 재생성되므로 제외
pub const INDEXES: &str = "
    SELECT I.INDEX_NAME,
           I.UNIQUENESS,
           DBMS_METADATA.GET_DDL('INDEX', I.INDEX_NAME, I.OWNER)
    FROM ALL_INDEXES I
    WHERE I.TABLE_OWNER = $1 AND I.TABLE_NAME = $2
      AND I.INDEX_TYPE NOT IN ('LOB')
      AND NOT EXISTS (
          SELECT 1 FROM ALL_CONSTRAINTS C
          WHERE C.OWNER = I.TABLE_OWNER AND C.TABLE_NAME = I.TABLE_NAME
            AND C.INDEX_NAME = I.INDEX_NAME
            AND C.CONSTRAINT_TYPE IN ('P', 'U'))
    ORDER BY I.INDEX_NAME";

/// 인덱스 컬럼 - $3 = 인덱스 이름
pub const INDEX_COLUMNS: &str = "
    SELECT COLUMN_NAME
    FROM ALL_IND_COLUMNS
    WHERE TABLE_OWNER = $1 AND TABLE_NAME = $2 AND INDEX_NAME = $3
    ORDER BY COLUMN_POSITION";

/// 사용자 명명 제약 조건 정의 (외래 키는 REF_CONSTRAINT로 추출)
///
/// 네 번째 컬럼은 기본 키/고유 제약 조건이 사용하는 인덱스 이름.
pub const CONSTRAINTS: &str = "
    SELECT CONSTRAINT_NAME,
           CONSTRAINT_TYPE,
           DBMS_METADATA.GET_DDL(
               CASE CONSTRAINT_TYPE WHEN 'R' THEN 'REF_CONSTRAINT' ELSE 'CONSTRAINT' END,
               CONSTRAINT_NAME, OWNER),
           CASE WHEN CONSTRAINT_TYPE IN ('P', 'U') THEN INDEX_NAME END
    FROM ALL_CONSTRAINTS
    WHERE OWNER = $1 AND TABLE_NAME = $2
      AND CONSTRAINT_TYPE IN ('P', 'U', 'C', 'R')
      AND GENERATED = 'USER NAME'
    ORDER BY CONSTRAINT_NAME";

/// 파티션 목록 (HIGH_VALUE는 LONG 컬럼이라 문자열로 변환)
pub const PARTITIONS: &str = "
    SELECT PARTITION_NAME,
           TO_CHAR(HIGH_VALUE),
           TO_CHAR(PARTITION_POSITION)
    FROM ALL_TAB_PARTITIONS
    WHERE TABLE_OWNER = $1 AND TABLE_NAME = $2
    ORDER BY PARTITION_POSITION";

/// 행 수 조회 쿼리
pub fn row_count(qualified_table: &str) -> String {
    format!("SELECT TO_CHAR(COUNT(*)) FROM {}", qualified_table)
}

/// 날짜 컬럼 최소/최대 조회 쿼리 (YYYY-MM-DD 문자열)
pub fn date_range(qualified_table: &str, quoted_column: &str) -> String {
    format!(
        "SELECT TO_CHAR(MIN({col}), 'YYYY-MM-DD'), TO_CHAR(MAX({col}), 'YYYY-MM-DD') FROM {table}",
        col = quoted_column,
        table = qualified_table
    )
}
