// 수명 주기(ILM) 정책 생성
// 계층 템플릿의 나이 기준으로 프로파일과 계층 이동 정책을 만들어 저장소에 넘깁니다.
// 정책 평가와 실제 이동은 외부 정책 엔진이 담당합니다.

use log::info;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::{MigrationError, Result};
use crate::model::{MigrationTask, StepStatus, StepType, Tier, TierAge, TierSettings, TierTemplate};
use crate::partition::Compression;

/// 계층별 나이 기준 프로파일 (일 단위)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlmProfile {
    pub name: String,
    pub hot_days: u32,
    pub warm_days: u32,
    pub cold_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IlmAction {
    /// 같은 테이블스페이스 안에서 압축만 변경
    Compress,
    /// 다음 계층 테이블스페이스로 이동
    Move,
    ReadOnly,
}

impl IlmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IlmAction::Compress => "COMPRESS",
            IlmAction::Move => "MOVE",
            IlmAction::ReadOnly => "READ_ONLY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlmPolicy {
    pub policy_name: String,
    pub owner: String,
    pub table_name: String,
    pub from_tier: Tier,
    pub to_tier: Tier,
    pub action: IlmAction,
    pub after: TierAge,
    pub tablespace: Option<String>,
    pub compression: Option<Compression>,
}

impl IlmPolicy {
    pub fn describe(&self) -> String {
        let mut text = format!("{} -> {}: {}", self.from_tier, self.to_tier, self.action.as_str());
        if let Some(tablespace) = &self.tablespace {
            text.push_str(&format!(" TO {}", tablespace));
        }
        if let Some(compression) = self.compression {
            text.push_str(&format!(" {}", compression.clause()));
        }
        text.push_str(&format!(" AFTER {}", self.after));
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlmPlan {
    pub task_id: i64,
    pub profile: IlmProfile,
    pub policies: Vec<IlmPolicy>,
}

/// 템플릿에서 ILM 계획 생성
pub fn derive_plan(task: &MigrationTask, template: &TierTemplate) -> IlmPlan {
    let profile = IlmProfile {
        name: format!("{}_{}", template.name.to_ascii_uppercase(), task.table_name),
        hot_days: template.hot.age.approx_days(),
        warm_days: template.warm.age.approx_days(),
        cold_days: template.cold.age.approx_days(),
    };

    let policies = vec![
        transition(task, &template.hot, &template.warm),
        transition(task, &template.warm, &template.cold),
        IlmPolicy {
            policy_name: policy_name(task, Tier::Cold, "RO"),
            owner: task.owner.clone(),
            table_name: task.table_name.clone(),
            from_tier: Tier::Cold,
            to_tier: Tier::Cold,
            action: IlmAction::ReadOnly,
            after: template.cold.age,
            tablespace: None,
            compression: None,
        },
    ];

    IlmPlan {
        task_id: task.id,
        profile,
        policies,
    }
}

fn transition(task: &MigrationTask, from: &TierSettings, to: &TierSettings) -> IlmPolicy {
    let action = if from.tablespace == to.tablespace {
        IlmAction::Compress
    } else {
        IlmAction::Move
    };
    IlmPolicy {
        policy_name: policy_name(task, from.tier, to.tier.as_str()),
        owner: task.owner.clone(),
        table_name: task.table_name.clone(),
        from_tier: from.tier,
        to_tier: to.tier,
        action,
        after: from.age,
        tablespace: match action {
            IlmAction::Move => Some(to.tablespace.clone()),
            _ => None,
        },
        compression: Some(to.compression),
    }
}

fn policy_name(task: &MigrationTask, from: Tier, suffix: &str) -> String {
    format!("ILM_{}_{}_{}", task.id, from.as_str(), suffix)
}

/// ILM 계획 저장 후 생성된 정책 수 검증
pub async fn apply(ctx: &ExecutionContext, plan: &IlmPlan) -> Result<usize> {
    let summary = plan
        .policies
        .iter()
        .map(IlmPolicy::describe)
        .collect::<Vec<_>>()
        .join("; ");

    if ctx.is_simulate() {
        ctx.note("APPLY_ILM", StepType::Ilm, StepStatus::Simulated, Some(summary))
            .await;
        return Ok(plan.policies.len());
    }

    let saved = ctx.store().save_ilm_policies(plan).await?;
    if saved != plan.policies.len() {
        let message = format!("ILM 정책 {} 개 중 {} 개만 생성되었습니다", plan.policies.len(), saved);
        ctx.note("VALIDATE_ILM", StepType::Ilm, StepStatus::Failed, Some(message.clone()))
            .await;
        return Err(MigrationError::Integrity(message));
    }

    ctx.note("APPLY_ILM", StepType::Ilm, StepStatus::Success, Some(summary))
        .await;
    info!("[{}] ILM 프로파일 {} 정책 {} 개 생성", plan.task_id, plan.profile.name, saved);
    Ok(saved)
}
