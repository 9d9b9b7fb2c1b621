/// 마이그레이션 제어 테이블 관련 SQL 쿼리 (migration 스키마)

/// 스키마 생성 쿼리
pub const CREATE_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS migration";

/// 제어 테이블 생성 쿼리 - 순서대로 실행
pub const CREATE_TABLES: [&str; 6] = [
    "CREATE TABLE IF NOT EXISTS migration.migration_tasks (
        id BIGINT PRIMARY KEY,
        owner TEXT NOT NULL,
        table_name TEXT NOT NULL,
        partition_type TEXT NOT NULL,
        partition_key TEXT NOT NULL,
        interval_clause TEXT,
        method TEXT NOT NULL,
        compression TEXT,
        tablespace TEXT,
        pctfree SMALLINT,
        parallel_degree INTEGER,
        tier_template TEXT,
        keep_original BOOLEAN NOT NULL DEFAULT FALSE,
        status TEXT NOT NULL DEFAULT 'READY',
        backup_table TEXT,
        can_rollback BOOLEAN NOT NULL DEFAULT FALSE,
        error_message TEXT,
        source_size_bytes BIGINT,
        target_size_bytes BIGINT,
        duration_seconds DOUBLE PRECISION,
        started_at TIMESTAMPTZ,
        completed_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS migration.analysis_records (
        task_id BIGINT PRIMARY KEY REFERENCES migration.migration_tasks(id),
        recommended_strategy TEXT,
        date_column TEXT,
        date_column_type TEXT,
        min_date DATE,
        max_date DATE,
        requires_conversion BOOLEAN NOT NULL DEFAULT FALSE,
        conversion_format TEXT,
        null_strategy TEXT NOT NULL DEFAULT 'ALLOW',
        null_replacement TEXT,
        null_count BIGINT NOT NULL DEFAULT 0,
        row_count BIGINT,
        blocking_issues TEXT[] NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS migration.tier_templates (
        name TEXT PRIMARY KEY,
        document TEXT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS migration.execution_log (
        id BIGSERIAL PRIMARY KEY,
        task_id BIGINT NOT NULL,
        execution_id UUID NOT NULL,
        step_number INTEGER NOT NULL,
        step_name TEXT NOT NULL,
        step_type TEXT NOT NULL,
        statement TEXT,
        status TEXT NOT NULL,
        started_at TIMESTAMPTZ NOT NULL,
        finished_at TIMESTAMPTZ NOT NULL,
        error TEXT
    )",
    "CREATE TABLE IF NOT EXISTS migration.ilm_profiles (
        name TEXT PRIMARY KEY,
        task_id BIGINT NOT NULL,
        hot_days INTEGER NOT NULL,
        warm_days INTEGER NOT NULL,
        cold_days INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS migration.ilm_policies (
        policy_name TEXT PRIMARY KEY,
        task_id BIGINT NOT NULL,
        profile_name TEXT NOT NULL REFERENCES migration.ilm_profiles(name),
        owner TEXT NOT NULL,
        table_name TEXT NOT NULL,
        from_tier TEXT NOT NULL,
        to_tier TEXT NOT NULL,
        action TEXT NOT NULL,
        after_age TEXT NOT NULL,
        tablespace TEXT,
        compression TEXT
    )",
];

/// 실행 로그 조회 인덱스
pub const CREATE_INDICES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS execution_log_task_idx ON migration.execution_log(task_id, execution_id)",
    "CREATE INDEX IF NOT EXISTS ilm_policies_task_idx ON migration.ilm_policies(task_id)",
];

/// 작업 배타 잠금 (세션 수준)
pub const TRY_LOCK: &str = "SELECT pg_try_advisory_lock($1)";

/// 작업 잠금 해제
pub const UNLOCK: &str = "SELECT pg_advisory_unlock($1)";

/// 작업 조회
pub const SELECT_TASK: &str = "
    SELECT id, owner, table_name, partition_type, partition_key, interval_clause, method,
           compression, tablespace, pctfree, parallel_degree, tier_template, keep_original,
           status, backup_table, can_rollback, error_message, source_size_bytes,
           target_size_bytes, duration_seconds, started_at, completed_at
    FROM migration.migration_tasks
    WHERE id = $1";

/// 분석 레코드 조회
pub const SELECT_ANALYSIS: &str = "
    SELECT task_id, recommended_strategy, date_column, date_column_type, min_date, max_date,
           requires_conversion, conversion_format, null_strategy, null_replacement, null_count,
           row_count, blocking_issues
    FROM migration.analysis_records
    WHERE task_id = $1";

/// 계층 템플릿 문서 조회
pub const SELECT_TIER_TEMPLATE: &str = "
    SELECT document FROM migration.tier_templates WHERE UPPER(name) = UPPER($1)";

/// 작업 상태 및 결과 필드 갱신
pub const UPDATE_TASK: &str = "
    UPDATE migration.migration_tasks
    SET status = $2,
        backup_table = $3,
        can_rollback = $4,
        error_message = $5,
        source_size_bytes = $6,
        target_size_bytes = $7,
        duration_seconds = $8,
        started_at = $9,
        completed_at = $10
    WHERE id = $1";

/// 실행 로그 단계 추가
pub const INSERT_STEP: &str = "
    INSERT INTO migration.execution_log
        (task_id, execution_id, step_number, step_name, step_type, statement, status,
         started_at, finished_at, error)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

/// ILM 프로파일 저장 (같은 이름은 덮어씀)
pub const UPSERT_ILM_PROFILE: &str = "
    INSERT INTO migration.ilm_profiles (name, task_id, hot_days, warm_days, cold_days)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (name) DO UPDATE
    SET task_id = EXCLUDED.task_id,
        hot_days = EXCLUDED.hot_days,
        warm_days = EXCLUDED.warm_days,
        cold_days = EXCLUDED.cold_days";

/// ILM 정책 저장 (같은 이름은 덮어씀)
pub const UPSERT_ILM_POLICY: &str = "
    INSERT INTO migration.ilm_policies
        (policy_name, task_id, profile_name, owner, table_name, from_tier, to_tier, action,
         after_age, tablespace, compression)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ON CONFLICT (policy_name) DO UPDATE
    SET task_id = EXCLUDED.task_id,
        profile_name = EXCLUDED.profile_name,
        owner = EXCLUDED.owner,
        table_name = EXCLUDED.table_name,
        from_tier = EXCLUDED.from_tier,
        to_tier = EXCLUDED.to_tier,
        action = EXCLUDED.action,
        after_age = EXCLUDED.after_age,
        tablespace = EXCLUDED.tablespace,
        compression = EXCLUDED.compression";
