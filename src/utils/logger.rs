use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lambda 進階日誌設定所提供的等級
pub const LAMBDA_LOG_LEVEL_VAR: &str = "AWS_LAMBDA_LOG_LEVEL";

/// 本服務依指定等級輸出，HTTP 堆疊只留警告，runtime 留生命週期訊息
pub fn default_directives(level: &str) -> String {
    format!(
        "onboarding_intake={},lambda_runtime=info,reqwest=warn,hyper=warn,hyper_util=warn",
        level
    )
}

pub fn init_cli_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// RUST_LOG 優先，其次為 AWS_LAMBDA_LOG_LEVEL，皆未設定時為 info
pub fn init_lambda_logger() {
    let level = lambda_log_level(std::env::var(LAMBDA_LOG_LEVEL_VAR).ok().as_deref());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .without_time() // CloudWatch 自帶時間戳
                .json(),
        )
        .init();
}

fn lambda_log_level(configured: Option<&str>) -> &'static str {
    match configured.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => "trace",
        Some("DEBUG") => "debug",
        Some("WARN") => "warn",
        Some("ERROR") | Some("FATAL") => "error",
        _ => "info",
    }
}
