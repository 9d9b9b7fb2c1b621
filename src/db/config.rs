use serde::{Deserialize, Serialize};

/// 데이터베이스 연결 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_connection_pool_size")]
    pub max_connections: usize,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_connection_pool_size() -> usize {
    8
}

fn default_connection_timeout() -> u64 {
    30
}

/// 데이터베이스 설정
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbConfig {
    pub connection: ConnectionConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "warehouse".to_string(),
                user: "migrator".to_string(),
                password: String::new(),
                max_connections: default_connection_pool_size(),
                connection_timeout_seconds: default_connection_timeout(),
            },
        }
    }
}

impl DbConfig {
    /// 연결 문자열 생성 (비밀번호 제외, 로그용)
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.connection.user, self.connection.host, self.connection.port, self.connection.database
        )
    }

    pub fn get_max_connections(&self) -> usize {
        self.connection.max_connections
    }
}
