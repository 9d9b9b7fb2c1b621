// 마이그레이션 데이터 모델
// 작업, 분석 레코드, 계층 템플릿, 실행 로그 단계를 정의합니다.

pub mod analysis;
pub mod step;
pub mod task;
pub mod template;

pub use analysis::{AnalysisRecord, NullStrategy};
pub use step::{ExecutionStep, StepStatus, StepType};
pub use task::{MigrationMethod, MigrationTask, PartitionType, TaskStatus};
pub use template::{Tier, TierAge, TierSettings, TierTemplate};
