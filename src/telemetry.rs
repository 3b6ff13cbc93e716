//! 日志初始化
//! 过滤器优先取 RUST_LOG，其次取配置中的级别

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// 初始化全局 subscriber；重复调用（例如测试中）不会报错
pub fn init_telemetry(config: &LoggingConfig) {
    let installed = tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(output_layer(config.format))
        .try_init()
        .is_ok();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = ?config.format,
        installed,
        "Telemetry initialized"
    );
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer().with_target(false);

    match format {
        // http_request 跨度关闭时输出耗时
        LogFormat::Json => layer.json().with_span_events(FmtSpan::CLOSE).boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}
