// 작업 저장소 인터페이스
// 작업 잠금, 입력 레코드 조회, 상태/실행 로그 기록을 담당합니다.

use async_trait::async_trait;

use crate::error::Result;
use crate::ilm::IlmPlan;
use crate::model::{AnalysisRecord, ExecutionStep, MigrationTask, TierTemplate};

/// 마이그레이션 제어 테이블 접근
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 작업 배타 잠금 획득 - 다른 실행이 잡고 있으면 false
    async fn lock_task(&self, task_id: i64) -> Result<bool>;

    async fn release_task(&self, task_id: i64) -> Result<()>;

    async fn load_task(&self, task_id: i64) -> Result<Option<MigrationTask>>;

    async fn load_analysis(&self, task_id: i64) -> Result<Option<AnalysisRecord>>;

    async fn load_tier_template(&self, name: &str) -> Result<Option<TierTemplate>>;

    /// 상태, 백업 이름, 지표 필드 갱신
    async fn update_task(&self, task: &MigrationTask) -> Result<()>;

    /// 실행 로그 단계 추가 (수정 없음)
    async fn append_step(&self, step: &ExecutionStep) -> Result<()>;

    /// ILM 프로파일과 정책 저장 - 저장된 정책 수 반환
    async fn save_ilm_policies(&self, plan: &IlmPlan) -> Result<usize>;
}
