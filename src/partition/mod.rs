// 파티션 계획 모듈
// 경계 계산, DDL 구문 생성, 파티션 이름 변환을 담당합니다.

pub mod boundary;
pub mod ddl;
pub mod interval;
pub mod naming;
pub mod plan;

pub use boundary::{PartitionBoundary, TierBoundaries, TierCutoffs};
pub use ddl::{Compression, CreateTableStatement, PartitionSpec, StorageClause};
pub use interval::Granularity;
pub use naming::resolve_partition_name;
pub use plan::{build_create_table, BuildRequest, BuiltTable, ColumnConversion, PlanMode};
