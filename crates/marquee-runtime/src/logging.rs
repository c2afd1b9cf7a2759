use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use marquee_core::config::LoggingConfig;

const DEFAULT_FILTER: &str = "marquee=info";

/// Install the global subscriber. Keep the returned guard alive so buffered
/// file output is flushed on exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = std::env::var("MARQUEE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer());

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "marquee.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
