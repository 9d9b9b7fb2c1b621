// 로그 출력 설정
// RUST_LOG 환경 변수가 있으면 그 필터를 우선 적용합니다.

use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// 로그 형식: [시각 수준 파일:줄] 메시지
pub fn setup_logger(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .filter(None, level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // 테스트 등에서 이미 초기화된 경우 무시
    let _ = builder.try_init();
}

/// -v 횟수를 로그 수준으로 변환
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
