// 계층형 파티션 마이그레이션 라이브러리
// 비파티션 테이블을 계층 템플릿에 따라 파티션 테이블로 전환합니다.

pub mod config;
pub mod constants;
pub mod context;
pub mod db;
pub mod engine;
pub mod error;
pub mod ident;
pub mod ilm;
pub mod logging;
pub mod model;
pub mod objects;
pub mod orchestrator;
pub mod partition;
pub mod store;
pub mod strategy;

pub use context::ExecutionContext;
pub use engine::Engine;
pub use error::{EngineError, MigrationError, Result};
pub use orchestrator::{Orchestrator, OutcomeStatus, TaskOutcome};
pub use store::TaskStore;
