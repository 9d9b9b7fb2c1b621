// 종속 객체 재구성
// 원본 테이블의 인덱스/제약 조건 정의를 새 테이블 기준으로 바꿔 임시 이름(_MIGR)으로 생성하고,
// 컷오버 후 2단계 이름 변경으로 정식 이름을 돌려줍니다.

pub mod rewrite;

use log::{debug, info, warn};

use crate::constants::{MIGR_SUFFIX, OLD_SUFFIX};
use crate::context::ExecutionContext;
use crate::engine::{DependentObject, ObjectKind};
use crate::error::Result;
use crate::ident::{qualified, quote, strip_suffix, suffixed};
use crate::model::StepType;
use crate::partition::ColumnConversion;

pub use rewrite::{make_local, rewrite_definition, NameMap};

/// 임시 이름으로 생성된 객체
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRename {
    pub kind: ObjectKind,
    pub canonical: String,
    pub temporary: String,
    /// 원본 제약 조건의 받침 인덱스 이름
    pub backing_index: Option<String>,
}

impl ObjectRename {
    /// (종류, 정식 이름, 새 테이블 쪽 임시 이름) 목록
    ///
    /// 새 제약 조건의 암시적 인덱스는 제약 조건의 임시 이름을 받습니다.
    fn names(&self) -> Vec<(ObjectKind, &str, &str)> {
        let mut names = vec![(self.kind, self.canonical.as_str(), self.temporary.as_str())];
        if let Some(index) = &self.backing_index {
            names.push((ObjectKind::Index, index.as_str(), self.temporary.as_str()));
        }
        names
    }
}

/// 재구성 대상 정보
pub struct RebuildRequest<'a> {
    pub owner: &'a str,
    pub source_table: &'a str,
    pub target_table: &'a str,
    /// 원본 기준 파티션 키 (LOCAL 가능 여부 판단)
    pub partition_key: &'a str,
    pub conversion: Option<&'a ColumnConversion>,
    pub max_identifier_length: usize,
}

/// 이전 실패 실행이 남긴 _MIGR 인덱스와 테이블 정리
pub async fn cleanup_stale(ctx: &ExecutionContext, owner: &str, target_table: &str) -> Result<bool> {
    if !ctx.engine().table_exists(owner, target_table).await? {
        return Ok(false);
    }

    warn!("이전 실행의 임시 테이블 발견: {}.{} - 정리 후 진행", owner, target_table);
    let leftovers = ctx.engine().dependent_objects(owner, target_table).await?;
    for object in leftovers
        .iter()
        .filter(|o| o.kind == ObjectKind::Index && o.name.ends_with(MIGR_SUFFIX))
    {
        let sql = format!("DROP INDEX {}", qualified(owner, &object.name));
        ctx.execute_tolerant("DROP_STALE_INDEX", StepType::Cleanup, &sql).await;
    }

    let sql = format!("DROP TABLE {} PURGE", qualified(owner, target_table));
    ctx.execute("DROP_STALE_TABLE", StepType::Cleanup, &sql).await?;
    Ok(true)
}

/// 인덱스와 제약 조건을 임시 이름으로 재생성
///
/// 인덱스, 기본 키, 고유/체크, 외래 키 순으로 만듭니다. 외래 키 실패는 경고입니다.
pub async fn rebuild(ctx: &ExecutionContext, req: &RebuildRequest<'_>) -> Result<Vec<ObjectRename>> {
    let mut objects = ctx.engine().dependent_objects(req.owner, req.source_table).await?;
    objects.sort_by_key(|o| (o.kind.is_constraint(), o.kind.rebuild_rank()));

    let names = name_map(req, &objects);
    let mut installed = Vec::with_capacity(objects.len());

    for object in &objects {
        let temporary = suffixed(&object.name, MIGR_SUFFIX, req.max_identifier_length);
        let mut sql = rewrite_definition(&object.definition, &names);

        match object.kind {
            ObjectKind::Index => {
                if can_be_local(object, req.partition_key) {
                    match make_local(&sql) {
                        Some(local) => sql = local,
                        None => debug!("LOCAL 지정 불가 - 정의 유지: {}", object.name),
                    }
                }
                ctx.execute("CREATE_INDEX", StepType::Index, &sql).await?;
            }
            ObjectKind::ForeignKey => {
                // 참조 대상이 아직 마이그레이션 전일 수 있음
                if !ctx.execute_tolerant("ADD_FOREIGN_KEY", StepType::Constraint, &sql).await {
                    warn!("외래 키 {} 재생성 실패 - 건너뜀", object.name);
                    continue;
                }
            }
            _ => {
                ctx.execute("ADD_CONSTRAINT", StepType::Constraint, &sql).await?;
            }
        }

        installed.push(ObjectRename {
            kind: object.kind,
            canonical: object.name.clone(),
            temporary,
            backing_index: object.backing_index.clone(),
        });
    }

    info!(
        "{}.{} 종속 객체 {} 개 재생성 (원본 {} 개)",
        req.owner,
        req.target_table,
        installed.len(),
        objects.len()
    );
    Ok(installed)
}

fn name_map(req: &RebuildRequest<'_>, objects: &[DependentObject]) -> NameMap {
    let mut names = NameMap::new();
    names.insert(req.source_table, req.target_table);
    for object in objects {
        names.insert(&object.name, suffixed(&object.name, MIGR_SUFFIX, req.max_identifier_length));
    }
    if let Some(conversion) = req.conversion {
        names.insert(&conversion.source_column, conversion.target_column.clone());
    }
    names
}

/// 고유 인덱스는 파티션 키를 포함해야 LOCAL 가능
fn can_be_local(object: &DependentObject, partition_key: &str) -> bool {
    !object.unique || object.columns.iter().any(|c| c.eq_ignore_ascii_case(partition_key))
}

/// 컷오버 후 2단계 이름 변경
///
/// 1단계: 원본 쪽 객체를 _OLD로, 2단계: 새 객체의 _MIGR을 정식 이름으로 바꿉니다.
/// 제약 조건의 받침 인덱스도 함께 바꿉니다.
/// 같은 이름의 객체가 동시에 존재하는 순간이 없도록 1단계를 모두 끝낸 뒤 2단계를 시작합니다.
/// 실패는 경고로 남기고 실패 건수를 반환합니다.
pub async fn swap_names(
    ctx: &ExecutionContext,
    owner: &str,
    old_table: Option<&str>,
    new_table: &str,
    renames: &[ObjectRename],
    max_len: usize,
) -> usize {
    let mut failures = 0;

    if let Some(old_table) = old_table {
        for (kind, canonical, _) in renames.iter().flat_map(ObjectRename::names) {
            let retired = suffixed(canonical, OLD_SUFFIX, max_len);
            let (name, sql) = rename_sql(owner, old_table, kind, canonical, &retired, "RENAME_OLD");
            if !ctx.execute_tolerant(&name, StepType::Rename, &sql).await {
                failures += 1;
            }
        }
    }

    for (kind, canonical, temporary) in renames.iter().flat_map(ObjectRename::names) {
        let (name, sql) = rename_sql(owner, new_table, kind, temporary, canonical, "RENAME_NEW");
        if !ctx.execute_tolerant(&name, StepType::Rename, &sql).await {
            failures += 1;
        }
    }

    if failures > 0 {
        warn!("{}.{} 객체 이름 변경 {} 건 실패", owner, new_table, failures);
    }
    failures
}

/// 롤백 시 _OLD 객체 이름 복원
pub async fn restore_names(ctx: &ExecutionContext, owner: &str, table: &str) -> Result<usize> {
    let objects = ctx.engine().dependent_objects(owner, table).await?;
    let mut restored = 0;
    for object in &objects {
        let mut current = vec![(object.kind, object.name.as_str())];
        if object.kind != ObjectKind::Index {
            if let Some(index) = object.index_name() {
                current.push((ObjectKind::Index, index));
            }
        }
        for (kind, retired) in current {
            let Some(canonical) = strip_suffix(retired, OLD_SUFFIX) else {
                continue;
            };
            let (name, sql) = rename_sql(owner, table, kind, retired, canonical, "RESTORE");
            if ctx.execute_tolerant(&name, StepType::Rollback, &sql).await {
                restored += 1;
            }
        }
    }
    Ok(restored)
}

fn rename_sql(owner: &str, table: &str, kind: ObjectKind, from: &str, to: &str, prefix: &str) -> (String, String) {
    match kind {
        ObjectKind::Index => (
            format!("{}_INDEX", prefix),
            format!("ALTER INDEX {} RENAME TO {}", qualified(owner, from), quote(to)),
        ),
        _ => (
            format!("{}_CONSTRAINT", prefix),
            format!(
                "ALTER TABLE {} RENAME CONSTRAINT {} TO {}",
                qualified(owner, table),
                quote(from),
                quote(to)
            ),
        ),
    }
}
