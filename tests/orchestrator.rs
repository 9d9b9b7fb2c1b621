mod common;

use common::{d, Fixture, SOURCE_ROWS};

use tiered_migrator::engine::PartitionInfo;
use tiered_migrator::error::EngineError;
use tiered_migrator::model::{MigrationMethod, NullStrategy, StepStatus, StepType, TaskStatus};
use tiered_migrator::OutcomeStatus;

#[tokio::test]
async fn ctas_swaps_tables_and_object_names() {
    let fx = Fixture::new("CTAS");
    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Ctas));

    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.can_rollback);
    assert_eq!(task.backup_table.as_deref(), Some("SALES_OLD"));
    assert_eq!(task.source_size_bytes, Some(SOURCE_ROWS * 100));
    assert!(task.duration_seconds.is_some());

    let migrated = fx.engine.table("SALES").unwrap();
    assert_eq!(migrated.rows, SOURCE_ROWS);
    let mut names: Vec<_> = migrated.objects.iter().map(|o| o.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["IX_SALES_REGION", "PK_SALES"]);

    let retired = fx.engine.table("SALES_OLD").unwrap();
    let mut names: Vec<_> = retired.objects.iter().map(|o| o.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["IX_SALES_REGION_OLD", "PK_SALES_OLD"]);

    // 원본 객체가 먼저 비켜난 뒤 새 객체가 정식 이름을 받음
    let old = fx.engine.position("RENAME TO \"IX_SALES_REGION_OLD\"").unwrap();
    let new = fx.engine.position("RENAME TO \"IX_SALES_REGION\"").unwrap();
    assert!(old < new);

    let index = fx.engine.statements().into_iter().find(|s| s.starts_with("CREATE INDEX")).unwrap();
    assert!(index.contains("\"SALES_MIGR\""));
    assert!(index.ends_with("LOCAL"));

    let names = fx.store.step_names();
    assert!(names.contains(&"VALIDATE_ROW_COUNT".to_string()));
    assert_eq!(names.last().map(String::as_str), Some("MIGRATION_COMPLETED"));
    assert!(!fx.store.is_locked(1));
}

#[tokio::test]
async fn ctas_copy_failure_drops_new_table() {
    let fx = Fixture::new("CTAS");
    fx.engine.fail_on("INSERT", EngineError::failed("ORA-01653: unable to extend table"));

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("COPY_DATA"));
    assert!(!task.can_rollback);

    assert!(!fx.engine.has_table("SALES_MIGR"));
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
    assert!(fx.engine.position("DROP TABLE \"DW\".\"SALES_MIGR\" PURGE").is_some());
    assert!(fx.engine.position("RENAME TO \"SALES_OLD\"").is_none());
}

#[tokio::test]
async fn stale_interim_table_is_dropped_first() {
    let fx = Fixture::new("CTAS");
    fx.engine.add_table("SALES_MIGR", common::FakeTable { rows: 17, ..Default::default() });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    let drop = fx.engine.position("DROP TABLE \"DW\".\"SALES_MIGR\"").unwrap();
    let create = fx.engine.position("CREATE TABLE \"DW\".\"SALES_MIGR\"").unwrap();
    assert!(drop < create);
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
}

#[tokio::test]
async fn keep_original_leaves_source_untouched() {
    let fx = Fixture::new("CTAS");
    fx.update_task(|t| t.keep_original = true);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(fx.engine.table("SALES").unwrap().objects.len(), 2);
    assert_eq!(fx.engine.table("SALES_MIGR").unwrap().rows, SOURCE_ROWS);
    assert!(fx.engine.position("RENAME TO").is_none());

    let rolled_back = fx.orchestrator().rollback(1).await;
    assert_eq!(rolled_back.status, OutcomeStatus::RolledBack);
    assert!(!fx.engine.has_table("SALES_MIGR"));
    assert!(fx.engine.has_table("SALES"));
}

#[tokio::test]
async fn online_falls_back_when_conversion_is_needed() {
    let fx = Fixture::new("ONLINE");
    fx.update_task(|t| t.partition_key = "SALE_DAY".to_string());
    fx.update_analysis(|a| {
        a.date_column = Some("SALE_DAY".to_string());
        a.date_column_type = Some("NUMBER".to_string());
        a.requires_conversion = true;
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Ctas));
    let fallback = fx
        .store
        .steps()
        .into_iter()
        .find(|s| s.step_name == "FALLBACK_ONLINE")
        .unwrap();
    assert_eq!(fallback.status, StepStatus::Warning);

    // 재구성 확인 호출 없이 바로 대체
    assert!(fx.engine.position("CAN_REDEF_TABLE").is_none());
    let copy = fx.engine.statements().into_iter().find(|s| s.starts_with("INSERT")).unwrap();
    assert!(copy.contains("TO_DATE(TO_CHAR(\"SALE_DAY\"), 'YYYYMMDD') AS \"SALE_DAY_CONVERTED\""));
    let create = fx.engine.statements().into_iter().find(|s| s.starts_with("CREATE TABLE")).unwrap();
    assert!(create.contains("PARTITION BY RANGE (\"SALE_DAY_CONVERTED\")"));
}

#[tokio::test]
async fn online_redefinition_completes() {
    let fx = Fixture::new("ONLINE");
    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Online));
    assert!(fx.engine.position("CONS_USE_PK").is_some());
    let start = fx.engine.position("START_REDEF_TABLE").unwrap();
    let finish = fx.engine.position("FINISH_REDEF_TABLE").unwrap();
    assert!(start < finish);

    let task = fx.store.task(1);
    assert_eq!(task.backup_table.as_deref(), Some("SALES_OLD"));
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
}

#[tokio::test]
async fn online_keep_original_restores_source_name() {
    let fx = Fixture::new("ONLINE");
    fx.update_task(|t| t.keep_original = true);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Online));
    // 원본 구조(객체 포함)는 원래 이름, 재구성 결과는 interim 이름
    assert_eq!(fx.engine.table("SALES").unwrap().objects.len(), 2);
    assert_eq!(fx.engine.table("SALES_MIGR").unwrap().rows, SOURCE_ROWS);
    assert!(!fx.engine.has_table("SALES_SWAP"));

    let swap = fx.engine.position("RENAME TO \"SALES_SWAP\"").unwrap();
    let restore = fx.engine.position("\"SALES_MIGR\" RENAME TO \"SALES\"").unwrap();
    assert!(swap < restore);
}

#[tokio::test]
async fn online_keep_original_undoes_swap_when_restore_fails() {
    let fx = Fixture::new("ONLINE");
    fx.update_task(|t| t.keep_original = true);
    fx.engine.fail_on("\"SALES_MIGR\" RENAME TO \"SALES\"", EngineError::failed("ORA-00054: resource busy"));

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(fx.store.task(1).error_message.unwrap().contains("RESTORE_ORIGINAL"));
    assert!(fx.engine.has_table("SALES"));
    assert!(fx.engine.has_table("SALES_MIGR"));
    assert!(!fx.engine.has_table("SALES_SWAP"));
    assert!(fx.engine.position("\"SALES_SWAP\" RENAME TO \"SALES\"").is_some());

    let undo = fx
        .store
        .steps()
        .into_iter()
        .find(|s| s.step_name == "UNDO_RENAME_NEW_TO_SWAP")
        .unwrap();
    assert_eq!(undo.status, StepStatus::Success);
}

#[tokio::test]
async fn online_keep_original_drops_swap_table_when_final_rename_fails() {
    let fx = Fixture::new("ONLINE");
    fx.update_task(|t| t.keep_original = true);
    fx.engine.fail_on("\"SALES_SWAP\" RENAME TO \"SALES_MIGR\"", EngineError::failed("ORA-00054: resource busy"));

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(fx.engine.table("SALES").unwrap().objects.len(), 2);
    assert!(!fx.engine.has_table("SALES_SWAP"));
    assert!(fx.engine.position("DROP TABLE \"DW\".\"SALES_SWAP\"").is_some());
}

#[tokio::test]
async fn small_tables_skip_online_redefinition() {
    let mut fx = Fixture::new("ONLINE");
    fx.config.online_min_rows = SOURCE_ROWS + 1;

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.method_used, Some(MigrationMethod::Ctas));
    assert!(fx.engine.position("DBMS_REDEFINITION").is_none());
}

#[tokio::test]
async fn privilege_error_falls_back_to_ctas() {
    let fx = Fixture::new("ONLINE");
    fx.engine.fail_on(
        "CAN_REDEF_TABLE",
        EngineError::classify(None, "ORA-01031: insufficient privileges"),
    );

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Ctas));
    assert!(fx.store.step_names().contains(&"FALLBACK_ONLINE".to_string()));
}

#[tokio::test]
async fn unexpected_probe_error_fails_without_fallback() {
    let fx = Fixture::new("ONLINE");
    fx.engine.fail_on(
        "CAN_REDEF_TABLE",
        EngineError::failed("ORA-03113: end-of-file on communication channel"),
    );

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(fx.store.task(1).status, TaskStatus::Failed);
    assert!(fx.engine.position("CREATE TABLE").is_none());
}

#[tokio::test]
async fn online_failure_aborts_redefinition() {
    let fx = Fixture::new("ONLINE");
    fx.engine.fail_on("SYNC_INTERIM_TABLE", EngineError::failed("ORA-00060: deadlock detected"));

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(fx.engine.position("ABORT_REDEF_TABLE").is_some());
    assert!(!fx.engine.has_table("SALES_MIGR"));
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
    assert!(fx.engine.position("FINISH_REDEF_TABLE").is_none());
}

#[tokio::test]
async fn exchange_spanning_two_months_falls_back() {
    let fx = Fixture::new("EXCHANGE");
    fx.update_analysis(|a| {
        a.min_date = Some(d(2024, 3, 20));
        a.max_date = Some(d(2024, 4, 5));
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Ctas));
    assert!(fx.store.step_names().contains(&"FALLBACK_EXCHANGE".to_string()));
    assert!(fx.engine.position("EXCHANGE PARTITION").is_none());
}

#[tokio::test]
async fn exchange_single_month_swaps_segments() {
    let fx = Fixture::new("EXCHANGE");
    fx.update_analysis(|a| {
        a.min_date = Some(d(2024, 3, 2));
        a.max_date = Some(d(2024, 3, 28));
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert_eq!(outcome.method_used, Some(MigrationMethod::Exchange));
    assert!(fx.engine.position("PARTITION \"P_202403\"").is_some());
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
    assert_eq!(fx.engine.table("SALES_EMPTY").unwrap().rows, 0);

    let task = fx.store.task(1);
    assert!(!task.can_rollback);
    assert_eq!(task.backup_table.as_deref(), Some("SALES_EMPTY"));

    // 교환 방식은 되돌릴 수 없음
    let rollback = fx.orchestrator().rollback(1).await;
    assert_eq!(rollback.status, OutcomeStatus::Rejected);
    assert_eq!(fx.store.task(1).status, TaskStatus::Completed);
}

#[tokio::test]
async fn non_startable_status_is_rejected() {
    let fx = Fixture::new("CTAS");
    fx.update_task(|t| t.status = TaskStatus::Running);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(fx.store.task(1).status, TaskStatus::Running);
    assert_eq!(fx.store.step_names(), vec!["VALIDATE_STATUS".to_string()]);
    assert!(fx.engine.statements().is_empty());
}

#[tokio::test]
async fn blocking_issues_fail_before_any_change() {
    let fx = Fixture::new("CTAS");
    fx.update_analysis(|a| a.blocking_issues = vec!["LONG 컬럼 포함".to_string()]);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("LONG"));
    assert!(fx.engine.statements().is_empty());
}

#[tokio::test]
async fn conversion_without_date_column_is_rejected() {
    let fx = Fixture::new("ONLINE");
    fx.update_analysis(|a| {
        a.date_column = None;
        a.requires_conversion = true;
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("날짜 컬럼"));
    assert!(fx.engine.position("CAN_REDEF_TABLE").is_none());
    assert!(fx.engine.statements().is_empty());
}

#[tokio::test]
async fn unknown_method_is_a_validation_failure() {
    let fx = Fixture::new("DATAPUMP");
    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(outcome.message.unwrap().contains("DATAPUMP"));
    assert!(fx.engine.statements().is_empty());
}

#[tokio::test]
async fn row_count_mismatch_fails_but_stays_rollbackable() {
    let fx = Fixture::new("CTAS");
    fx.engine.lose_rows_on_copy(10);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("행 수 불일치"));
    assert!(task.can_rollback);

    let rollback = fx.orchestrator().rollback(1).await;
    assert_eq!(rollback.status, OutcomeStatus::RolledBack, "{:?}", rollback.message);
    assert_eq!(fx.engine.table("SALES").unwrap().rows, SOURCE_ROWS);
}

#[tokio::test]
async fn dry_run_issues_no_mutating_statements() {
    let fx = Fixture::new("CTAS").with_template();
    let outcome = fx.orchestrator().run(1, true).await;

    assert_eq!(outcome.status, OutcomeStatus::Simulated, "{:?}", outcome.message);
    assert!(fx.engine.statements().is_empty());
    assert_eq!(fx.store.task(1).status, TaskStatus::Ready);
    assert!(fx.store.ilm_plans().is_empty());

    let planned: Vec<_> = outcome.statements().collect();
    assert!(planned.iter().any(|s| s.starts_with("CREATE TABLE \"DW\".\"SALES_MIGR\"")));
    assert!(planned.iter().any(|s| s.starts_with("INSERT")));
    assert!(!fx.store.steps_with_status(StepStatus::Simulated).is_empty());
    assert!(fx.store.steps_with_status(StepStatus::Success).iter().all(|s| s.statement.is_none()));
}

#[tokio::test]
async fn dry_run_online_only_probes() {
    let fx = Fixture::new("ONLINE");
    let outcome = fx.orchestrator().run(1, true).await;

    assert_eq!(outcome.status, OutcomeStatus::Simulated, "{:?}", outcome.message);
    let executed = fx.engine.statements();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("CAN_REDEF_TABLE"));
}

#[tokio::test]
async fn tiered_migration_saves_ilm_policies() {
    let fx = Fixture::new("CTAS").with_template();
    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    let create = fx.engine.statements().into_iter().find(|s| s.starts_with("CREATE TABLE")).unwrap();
    assert!(create.contains("COLD_TS"));
    assert!(create.contains("WARM_TS"));
    assert!(create.contains("HOT_TS"));

    let plans = fx.store.ilm_plans();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].policies.len(), 3);
    assert!(fx.store.step_names().contains(&"APPLY_ILM".to_string()));
}

#[tokio::test]
async fn partial_ilm_save_is_an_integrity_failure() {
    let fx = Fixture::new("CTAS").with_template();
    fx.store.limit_ilm(2);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(outcome.message.unwrap().contains("ILM"));
}

#[tokio::test]
async fn missing_template_is_a_validation_failure() {
    let fx = Fixture::new("CTAS");
    fx.update_task(|t| t.tier_template = Some("nope".to_string()));

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(fx.engine.statements().is_empty());
}

#[tokio::test]
async fn null_keys_are_remediated_before_copy() {
    let fx = Fixture::new("CTAS");
    fx.update_analysis(|a| {
        a.null_strategy = NullStrategy::Update;
        a.null_count = 12;
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    let update = fx
        .engine
        .position("UPDATE \"DW\".\"SALES\" SET \"SALE_DATE\" = DATE '1900-01-01' WHERE \"SALE_DATE\" IS NULL")
        .unwrap();
    let create = fx.engine.position("CREATE TABLE").unwrap();
    assert!(update < create);
}

#[tokio::test]
async fn null_keys_on_numeric_date_column_use_formatted_number() {
    let fx = Fixture::new("CTAS");
    fx.update_task(|t| t.partition_key = "SALE_DAY".to_string());
    fx.update_analysis(|a| {
        a.date_column = Some("SALE_DAY".to_string());
        a.date_column_type = Some("NUMBER".to_string());
        a.requires_conversion = true;
        a.null_strategy = NullStrategy::Update;
        a.null_count = 3;
    });

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert!(fx
        .engine
        .position("UPDATE \"DW\".\"SALES\" SET \"SALE_DAY\" = 19000101 WHERE \"SALE_DAY\" IS NULL")
        .is_some());
    assert!(fx.engine.position("DATE '1900-01-01'").is_none());
}

#[tokio::test]
async fn system_partitions_are_renamed_after_cutover() {
    let fx = Fixture::new("CTAS");
    fx.engine.set_created_partitions(vec![
        PartitionInfo {
            name: "P_INITIAL".to_string(),
            high_value: "TO_DATE(' 2020-12-01 00:00:00', 'SYYYY-MM-DD HH24:MI:SS', 'NLS_CALENDAR=GREGORIAN')"
                .to_string(),
            position: 1,
        },
        PartitionInfo {
            name: "SYS_P101".to_string(),
            high_value: "TO_DATE(' 2024-07-01 00:00:00', 'SYYYY-MM-DD HH24:MI:SS', 'NLS_CALENDAR=GREGORIAN')"
                .to_string(),
            position: 2,
        },
    ]);

    let outcome = fx.orchestrator().run(1, false).await;

    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
    assert!(fx
        .engine
        .position("ALTER TABLE \"DW\".\"SALES\" RENAME PARTITION \"SYS_P101\" TO \"P_202406\"")
        .is_some());
    assert_eq!(fx.engine.position("RENAME PARTITION \"P_INITIAL\""), None);
}

#[tokio::test]
async fn concurrent_run_is_rejected() {
    use tiered_migrator::TaskStore;

    let fx = Fixture::new("CTAS");
    assert!(fx.store.lock_task(1).await.unwrap());

    let outcome = fx.orchestrator().run(1, false).await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(fx.store.task(1).status, TaskStatus::Ready);
    assert!(fx.engine.statements().is_empty());

    fx.store.release_task(1).await.unwrap();
    let outcome = fx.orchestrator().run(1, false).await;
    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);
}

#[tokio::test]
async fn rollback_restores_original_table_and_names() {
    let fx = Fixture::new("CTAS");
    let outcome = fx.orchestrator().run(1, false).await;
    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);

    let rollback = fx.orchestrator().rollback(1).await;

    assert_eq!(rollback.status, OutcomeStatus::RolledBack, "{:?}", rollback.message);
    let task = fx.store.task(1);
    assert_eq!(task.status, TaskStatus::RolledBack);
    assert!(!task.can_rollback);

    assert!(!fx.engine.has_table("SALES_OLD"));
    let restored = fx.engine.table("SALES").unwrap();
    assert_eq!(restored.rows, SOURCE_ROWS);
    let mut names: Vec<_> = restored.objects.iter().map(|o| o.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["IX_SALES_REGION", "PK_SALES"]);
    assert!(fx.engine.position("DROP TABLE \"DW\".\"SALES\" PURGE").is_some());
}

#[tokio::test]
async fn constraint_backing_indexes_follow_their_constraints() {
    let fx = Fixture::new("CTAS");
    let outcome = fx.orchestrator().run(1, false).await;
    assert_eq!(outcome.status, OutcomeStatus::Completed, "{:?}", outcome.message);

    let backing = |table: &str| {
        fx.engine
            .table(table)
            .unwrap()
            .objects
            .iter()
            .find(|o| o.name.starts_with("PK_SALES"))
            .and_then(|o| o.backing_index.clone())
    };
    assert_eq!(backing("SALES").as_deref(), Some("PK_SALES"));
    assert_eq!(backing("SALES_OLD").as_deref(), Some("PK_SALES_OLD"));

    let retired = fx.engine.position("ALTER INDEX \"DW\".\"PK_SALES\" RENAME TO \"PK_SALES_OLD\"").unwrap();
    let promoted = fx.engine.position("ALTER INDEX \"DW\".\"PK_SALES_MIGR\" RENAME TO \"PK_SALES\"").unwrap();
    assert!(retired < promoted);
    assert!(!fx.store.steps().iter().any(|s| s.step_type == StepType::Rename && s.status == StepStatus::Warning));

    let rollback = fx.orchestrator().rollback(1).await;
    assert_eq!(rollback.status, OutcomeStatus::RolledBack, "{:?}", rollback.message);
    assert_eq!(backing("SALES").as_deref(), Some("PK_SALES"));
}

#[tokio::test]
async fn rollback_of_ready_task_is_rejected() {
    let fx = Fixture::new("CTAS");
    let outcome = fx.orchestrator().rollback(1).await;

    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(fx.store.task(1).status, TaskStatus::Ready);
    assert!(fx.engine.statements().is_empty());
}
