// 데이터베이스 관리 모듈
// 연결 풀, 대상 엔진 어댑터, 제어 테이블 저장소를 담당합니다.

pub mod config;
pub mod engine;
pub mod pool;
pub mod task_store;

pub use engine::PgEngine;
pub use pool::{create_pool, DatabasePool};
pub use task_store::PgTaskStore;
