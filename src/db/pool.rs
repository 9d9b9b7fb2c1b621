use std::time::Duration;

use deadpool_postgres::{Config, Object, Pool, Runtime};
use log::{debug, info};
use tokio_postgres::NoTls;

use super::config::DbConfig;
use crate::error::{store_err, Result};

/// 데이터베이스 풀 관리자 구조체
pub struct DatabasePool {
    pool: Pool,
    config: DbConfig,
}

impl DatabasePool {
    /// 새 DatabasePool 인스턴스 생성
    pub fn new(pool: Pool, config: DbConfig) -> Self {
        Self { pool, config }
    }

    /// 클라이언트 가져오기
    pub async fn get_client(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| store_err(format!("DB 연결 획득 실패 ({}): {}", self.config.describe(), e)))
    }

    /// 풀 상태 확인
    pub fn get_pool_status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            max_size: self.config.get_max_connections(),
            available: status.available,
            size: status.size,
        }
    }
}

/// 풀 상태 구조체
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub max_size: usize,
    pub available: usize,
    pub size: usize,
}

/// 데이터베이스 연결 풀 생성 후 연결 테스트
pub async fn create_pool(db_config: &DbConfig) -> Result<DatabasePool> {
    let conn_config = &db_config.connection;

    // deadpool-postgres 설정 생성
    let mut cfg = Config::new();
    cfg.host = Some(conn_config.host.clone());
    cfg.port = Some(conn_config.port);
    cfg.user = Some(conn_config.user.clone());
    cfg.password = Some(conn_config.password.clone());
    cfg.dbname = Some(conn_config.database.clone());
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(conn_config.max_connections));
    cfg.connect_timeout = Some(Duration::from_secs(conn_config.connection_timeout_seconds));

    debug!(
        "DB 연결 풀 생성 중... {} (최대 연결: {})",
        db_config.describe(),
        conn_config.max_connections
    );
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| store_err(format!("DB 연결 풀 생성 실패: {}", e)))?;

    let pool = DatabasePool::new(pool, db_config.clone());

    // 연결 테스트
    let client = pool.get_client().await?;
    client
        .execute("SELECT 1", &[])
        .await
        .map_err(|e| store_err(format!("DB 연결 테스트 실패: {}", e)))?;
    info!("DB 연결 풀 생성 완료 및 연결 테스트 성공: {}", db_config.describe());

    Ok(pool)
}
