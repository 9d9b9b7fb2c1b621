pub mod settings;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUFFER_PERIODS, DEFAULT_HASH_PARTITIONS, DEFAULT_MAX_IDENTIFIER_LENGTH, DEFAULT_ONLINE_MIN_ROWS,
};
use crate::db::config::DbConfig;
use crate::error::Result;

pub use settings::{ConfigSource, Settings};

/// 마이그레이션 동작 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// 균일 레이아웃 초기 경계 아래 여유 기간 수
    #[serde(default = "default_buffer_periods")]
    pub uniform_buffer_periods: u32,
    #[serde(default = "default_hash_partitions")]
    pub hash_partitions: u32,
    /// 작업에 병렬도가 없을 때 사용
    #[serde(default)]
    pub parallel_degree: Option<u32>,
    /// 온라인 재구성을 시도할 최소 행 수
    #[serde(default = "default_online_min_rows")]
    pub online_min_rows: i64,
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,
    /// 마이그레이션 전 전체 백업 테이블 생성
    #[serde(default)]
    pub create_backup: bool,
    #[serde(default = "default_true")]
    pub validate_row_counts: bool,
    #[serde(default = "default_true")]
    pub apply_ilm: bool,
    #[serde(default = "default_true")]
    pub rename_partitions: bool,
}

fn default_buffer_periods() -> u32 {
    DEFAULT_BUFFER_PERIODS
}

fn default_hash_partitions() -> u32 {
    DEFAULT_HASH_PARTITIONS
}

fn default_online_min_rows() -> i64 {
    DEFAULT_ONLINE_MIN_ROWS
}

fn default_max_identifier_length() -> usize {
    DEFAULT_MAX_IDENTIFIER_LENGTH
}

fn default_true() -> bool {
    true
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            uniform_buffer_periods: default_buffer_periods(),
            hash_partitions: default_hash_partitions(),
            parallel_degree: None,
            online_min_rows: default_online_min_rows(),
            max_identifier_length: default_max_identifier_length(),
            create_backup: false,
            validate_row_counts: true,
            apply_ilm: true,
            rename_partitions: true,
        }
    }
}

/// 설정 파일 (migrator.yml)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// 작업/실행 로그 제어 테이블이 있는 데이터베이스
    #[serde(default)]
    pub database: DbConfig,
    /// 마이그레이션 대상 엔진 (PG 와이어 프로토콜 호환)
    #[serde(default)]
    pub engine: DbConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

impl Config {
    /// 설정 파일에서 Config 인스턴스 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_yaml::from_str(&contents)?;
        info!(
            "설정 파일 로드 완료: {} ({})",
            path.display(),
            config.database.describe()
        );
        Ok(config)
    }
}
