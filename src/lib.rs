pub mod config;
pub mod error;
pub mod queue;

pub use crate::config::Config;
pub use crate::error::{QueueError, QueueResult};
pub use crate::queue::{Drain, Item, ListStore, MemoryStore, QueueDrainer, RedisStore, queue_key};

pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let level_filter = match logging.level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    // 日志写到 stderr，stdout 留给队列内容
    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(level_filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_max_level(level_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
