use std::env;
use std::path::Path;

use log::{info, warn};

use crate::config::{Config, MigrationConfig};
use crate::db::config::DbConfig;
use crate::error::Result;

/// 기본 설정 파일
pub const DEFAULT_CONFIG_FILE: &str = "migrator.yml";

/// 설정 파일 경로 환경 변수
pub const CONFIG_FILE_ENV: &str = "MIGRATOR_CONFIG";

/// 설정 소스 우선순위
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// 환경 변수
    Environment,
    /// 설정 파일
    File,
    /// 기본값
    Default,
}

impl ConfigSource {
    fn label(&self) -> &'static str {
        match self {
            ConfigSource::Environment => "환경 변수",
            ConfigSource::File => "설정 파일",
            ConfigSource::Default => "기본값",
        }
    }
}

/// 통합 설정 관리자
#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DbConfig,
    pub engine: DbConfig,
    pub migration: MigrationConfig,
    pub source: ConfigSource,
}

impl Settings {
    /// 설정 로드 후 환경 변수 오버라이드 적용
    pub fn new() -> Result<Self> {
        let explicit = env::var(CONFIG_FILE_ENV).ok();
        let mut settings = Self::load(explicit.as_deref())?;
        settings.override_from_env();
        Ok(settings)
    }

    /// 설정 파일 로드 (명시 경로 > 현재 디렉토리 migrator.yml > 기본값)
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        // 1. 지정된 설정 파일 - 지정했는데 읽지 못하면 오류
        if let Some(path) = explicit {
            info!("환경 변수에서 설정 파일 경로 로드: {}", path);
            let config = Config::from_file(path)?;
            return Ok(Self::from_config(config, ConfigSource::Environment));
        }

        // 2. 현재 디렉토리의 설정 파일
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            match Config::from_file(DEFAULT_CONFIG_FILE) {
                Ok(config) => return Ok(Self::from_config(config, ConfigSource::File)),
                Err(e) => {
                    warn!("기본 설정 파일 로드 실패: {}", e);
                }
            }
        }

        // 3. 기본 설정 사용
        info!("설정 파일을 찾을 수 없어 기본 설정 사용");
        Ok(Self::from_config(Config::default(), ConfigSource::Default))
    }

    fn from_config(config: Config, source: ConfigSource) -> Self {
        Self {
            database: config.database,
            engine: config.engine,
            migration: config.migration,
            source,
        }
    }

    /// 환경 변수에서 설정 값 오버라이드
    pub fn override_from_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 조회 함수로 주어진 값 오버라이드
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overridden = false;
        let connection = &mut self.database.connection;

        if let Some(host) = lookup("DB_HOST") {
            info!("환경 변수에서 DB 호스트 설정: {}", host);
            connection.host = host;
            overridden = true;
        }

        if let Some(port) = lookup("DB_PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    info!("환경 변수에서 DB 포트 설정: {}", port);
                    connection.port = port;
                    overridden = true;
                }
                Err(_) => warn!("환경 변수 DB_PORT 값이 유효한 포트 번호가 아님: {}", port),
            }
        }

        if let Some(name) = lookup("DB_NAME") {
            info!("환경 변수에서 DB 이름 설정: {}", name);
            connection.database = name;
            overridden = true;
        }

        if let Some(user) = lookup("DB_USER") {
            info!("환경 변수에서 DB 사용자 설정: {}", user);
            connection.user = user;
            overridden = true;
        }

        if let Some(password) = lookup("DB_PASSWORD") {
            info!("환경 변수에서 DB 비밀번호 설정");
            connection.password = password;
            overridden = true;
        }

        if let Some(max_conn) = lookup("DB_MAX_CONNECTIONS") {
            match max_conn.parse::<usize>() {
                Ok(max) if max > 0 => {
                    info!("환경 변수에서 DB 최대 연결 수 설정: {}", max);
                    connection.max_connections = max;
                    overridden = true;
                }
                _ => warn!("환경 변수 DB_MAX_CONNECTIONS 값이 유효하지 않음: {}", max_conn),
            }
        }

        if let Some(degree) = lookup("MIGRATOR_PARALLEL_DEGREE") {
            match degree.parse::<u32>() {
                Ok(degree) if degree > 0 => {
                    info!("환경 변수에서 병렬도 설정: {}", degree);
                    self.migration.parallel_degree = Some(degree);
                    overridden = true;
                }
                _ => warn!("환경 변수 MIGRATOR_PARALLEL_DEGREE 값이 유효하지 않음: {}", degree),
            }
        }

        if overridden {
            self.source = ConfigSource::Environment;
        }
    }

    /// 설정 정보 로그 출력
    pub fn log_settings(&self) {
        info!("설정 소스: {}", self.source.label());
        info!("제어 데이터베이스 연결: {}", self.database.describe());
        info!("대상 엔진 연결: {}", self.engine.describe());
        info!(
            "마이그레이션 옵션: 백업 {}, 행 수 검증 {}, ILM {}, 병렬도 {:?}",
            self.migration.create_backup,
            self.migration.validate_row_counts,
            self.migration.apply_ilm,
            self.migration.parallel_degree
        );
    }
}
