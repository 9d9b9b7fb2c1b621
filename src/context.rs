// 실행 컨텍스트
// 작업 실행 1회마다 만들어져 모든 단계에 전달됩니다.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::{Engine, EngineResult};
use crate::error::{execution_err, Result};
use crate::model::{ExecutionStep, StepStatus, StepType};
use crate::store::TaskStore;

/// 실행 1회의 상태 - 실행 ID, 단계 번호, 모의 실행 여부
pub struct ExecutionContext {
    execution_id: Uuid,
    task_id: i64,
    simulate: bool,
    step: AtomicU32,
    engine: Arc<dyn Engine>,
    store: Arc<dyn TaskStore>,
    steps: Mutex<Vec<ExecutionStep>>,
}

impl ExecutionContext {
    pub fn new(task_id: i64, simulate: bool, engine: Arc<dyn Engine>, store: Arc<dyn TaskStore>) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            task_id,
            simulate,
            step: AtomicU32::new(0),
            engine,
            store,
            steps: Mutex::new(Vec::new()),
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn is_simulate(&self) -> bool {
        self.simulate
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    /// 변경 구문 실행 - 모의 실행이면 SIMULATED로만 기록
    pub async fn execute(&self, name: &str, step_type: StepType, sql: &str) -> Result<u64> {
        let started = Utc::now();
        if self.simulate {
            self.record(name, step_type, Some(sql), StepStatus::Simulated, started, None)
                .await;
            return Ok(0);
        }

        debug!("[{}] {} 실행: {}", self.task_id, name, sql);
        match self.engine.execute(sql).await {
            Ok(rows) => {
                self.record(name, step_type, Some(sql), StepStatus::Success, started, None)
                    .await;
                Ok(rows)
            }
            Err(e) => {
                error!("[{}] {} 실패: {}", self.task_id, name, e);
                self.record(name, step_type, Some(sql), StepStatus::Failed, started, Some(e.to_string()))
                    .await;
                Err(execution_err(name, Some(sql.to_string()), e.to_string()))
            }
        }
    }

    /// 실패해도 계속 진행하는 구문 실행 - 실패는 WARNING으로 기록하고 false 반환
    pub async fn execute_tolerant(&self, name: &str, step_type: StepType, sql: &str) -> bool {
        let started = Utc::now();
        if self.simulate {
            self.record(name, step_type, Some(sql), StepStatus::Simulated, started, None)
                .await;
            return true;
        }

        match self.engine.execute(sql).await {
            Ok(_) => {
                self.record(name, step_type, Some(sql), StepStatus::Success, started, None)
                    .await;
                true
            }
            Err(e) => {
                warn!("[{}] {} 실패 (계속 진행): {}", self.task_id, name, e);
                self.record(name, step_type, Some(sql), StepStatus::Warning, started, Some(e.to_string()))
                    .await;
                false
            }
        }
    }

    /// 기능 확인 호출 - 모의 실행에서도 수행하고 엔진 오류를 그대로 반환
    pub async fn probe(&self, name: &str, sql: &str) -> EngineResult<u64> {
        let started = Utc::now();
        let result = self.engine.execute(sql).await;
        match &result {
            Ok(_) => {
                self.record(name, StepType::Validation, Some(sql), StepStatus::Success, started, None)
                    .await;
            }
            Err(e) => {
                info!("[{}] {} 확인 실패: {}", self.task_id, name, e);
                self.record(name, StepType::Validation, Some(sql), StepStatus::Warning, started, Some(e.to_string()))
                    .await;
            }
        }
        result
    }

    /// 구문 없는 단계 기록
    pub async fn note(&self, name: &str, step_type: StepType, status: StepStatus, message: Option<String>) {
        let started = Utc::now();
        self.record(name, step_type, None, status, started, message).await;
    }

    /// 지금까지 기록된 단계
    pub fn steps(&self) -> Vec<ExecutionStep> {
        match self.steps.lock() {
            Ok(steps) => steps.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn record(
        &self,
        name: &str,
        step_type: StepType,
        statement: Option<&str>,
        status: StepStatus,
        started_at: DateTime<Utc>,
        error: Option<String>,
    ) {
        let step = ExecutionStep {
            task_id: self.task_id,
            execution_id: self.execution_id,
            step_number: self.step.fetch_add(1, Ordering::SeqCst) + 1,
            step_name: name.to_string(),
            step_type,
            statement: statement.map(str::to_string),
            status,
            started_at,
            finished_at: Utc::now(),
            error,
        };

        if let Err(e) = self.store.append_step(&step).await {
            warn!("[{}] 실행 로그 기록 실패 ({}): {}", self.task_id, name, e);
        }

        match self.steps.lock() {
            Ok(mut steps) => steps.push(step),
            Err(poisoned) => poisoned.into_inner().push(step),
        }
    }
}
