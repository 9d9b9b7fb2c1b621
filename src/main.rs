use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info};

use tiered_migrator::config::Settings;
use tiered_migrator::db::{create_pool, PgEngine, PgTaskStore};
use tiered_migrator::error::Result;
use tiered_migrator::logging::{level_from_verbosity, setup_logger};
use tiered_migrator::model::{Tier, TierTemplate};
use tiered_migrator::partition::boundary::{tier_cutoffs, BoundaryInput, TierWindow};
use tiered_migrator::{Orchestrator, OutcomeStatus, TaskOutcome};

/// 비파티션 테이블을 계층형 파티션 테이블로 전환
#[derive(Parser, Debug)]
#[command(name = "tiered-migrator", version, about)]
struct Cli {
    /// 설정 파일 경로 (없으면 MIGRATOR_CONFIG, migrator.yml 순)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 로그 상세도 (-v 디버그, -vv 추적)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 경고 이상만 출력
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 마이그레이션 작업 실행
    Run {
        task_id: i64,
        /// 구문을 실행하지 않고 계획만 출력
        #[arg(long)]
        dry_run: bool,
    },
    /// 완료/실패 작업 되돌리기
    Rollback { task_id: i64 },
    /// 계층 템플릿 파일 검증
    CheckTemplate { file: String },
    /// 제어 스키마 생성
    InitSchema,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(level_from_verbosity(cli.verbose, cli.quiet));

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::CheckTemplate { file } => check_template(&file),
        Command::InitSchema => {
            let settings = load_settings(cli.config.as_deref())?;
            let pool = Arc::new(create_pool(&settings.database).await?);
            PgTaskStore::new(pool).ensure_schema().await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { task_id, dry_run } => {
            let orchestrator = build_orchestrator(cli.config.as_deref()).await?;
            let outcome = orchestrator.run(task_id, dry_run).await;
            if dry_run {
                print_plan(&outcome);
            }
            Ok(report(&outcome))
        }
        Command::Rollback { task_id } => {
            let orchestrator = build_orchestrator(cli.config.as_deref()).await?;
            let outcome = orchestrator.rollback(task_id).await;
            Ok(report(&outcome))
        }
    }
}

fn load_settings(explicit: Option<&str>) -> Result<Settings> {
    let settings = match explicit {
        Some(path) => {
            let mut settings = Settings::load(Some(path))?;
            settings.override_from_env();
            settings
        }
        None => Settings::new()?,
    };
    settings.log_settings();
    Ok(settings)
}

async fn build_orchestrator(explicit: Option<&str>) -> Result<Orchestrator> {
    let settings = load_settings(explicit)?;
    let control = Arc::new(create_pool(&settings.database).await?);
    let target = Arc::new(create_pool(&settings.engine).await?);

    let status = target.get_pool_status();
    info!("대상 엔진 풀: 사용 가능 {}/{} (최대 {})", status.available, status.size, status.max_size);

    Ok(Orchestrator::new(
        Arc::new(PgEngine::new(target)),
        Arc::new(PgTaskStore::new(control)),
        settings.migration,
    ))
}

fn check_template(file: &str) -> Result<ExitCode> {
    let template = TierTemplate::from_file(file)?;
    let now = Local::now().date_naive();
    let cutoffs = tier_cutoffs(&BoundaryInput {
        source_min: None,
        source_max: None,
        now,
        hot: TierWindow::from(&template.hot),
        warm: TierWindow::from(&template.warm),
        cold: TierWindow::from(&template.cold),
    })?;

    println!("템플릿 {} 검증 완료 (기준일 {})", template.name, now);
    for tier in [Tier::Hot, Tier::Warm, Tier::Cold] {
        let settings = template.tier(tier);
        let cutoff = match tier {
            Tier::Hot => cutoffs.hot,
            Tier::Warm => cutoffs.warm,
            Tier::Cold => cutoffs.cold,
        };
        println!(
            "  {:<4} {:<9} {:<10} {:<20} {} 이후 ({})",
            tier.as_str(),
            settings.granularity.as_str(),
            settings.age.to_string(),
            settings.tablespace,
            cutoff,
            settings.compression.clause()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_plan(outcome: &TaskOutcome) {
    println!("-- 작업 {} 모의 실행 {}", outcome.task_id, outcome.execution_id);
    for statement in outcome.statements() {
        println!("{};", statement.trim_end_matches(';'));
    }
}

fn report(outcome: &TaskOutcome) -> ExitCode {
    let method = outcome.method_used.map(|m| m.as_str()).unwrap_or("-");
    let message = outcome.message.as_deref().unwrap_or("");
    println!(
        "작업 {}: {:?} (방식 {}, 단계 {}개) {}",
        outcome.task_id,
        outcome.status,
        method,
        outcome.steps.len(),
        message
    );
    match outcome.status {
        OutcomeStatus::Completed | OutcomeStatus::Simulated | OutcomeStatus::RolledBack => ExitCode::SUCCESS,
        OutcomeStatus::Failed | OutcomeStatus::Rejected => ExitCode::FAILURE,
    }
}
