use std::fs::File;
use std::io::stderr;
use std::path::Path;
use std::sync::LazyLock;

use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::board::zobrist::ZOBRIST;

static LOGGING: LazyLock<()> = LazyLock::new(|| {
    // Console layer, env-filtered, INFO by default
    let console_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let console_layer = fmt::layer()
        .without_time()
        .with_writer(stderr)
        .with_filter(console_filter);

    let registry = tracing_subscriber::registry().with(console_layer);

    // File layer only when SKEWER_LOG_DIR is set
    if let Ok(dir) = std::env::var("SKEWER_LOG_DIR") {
        let log_dir = Path::new(&dir);
        if !log_dir.exists() {
            std::fs::create_dir_all(log_dir).expect("failed to create log directory");
        }
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let log_file = File::create(log_dir.join(format!("skewer_{timestamp}.log")))
            .expect("failed to create log file");
        let (writer, guard) = non_blocking(log_file);
        std::mem::forget(guard); // keep the flusher alive for the process

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug"));
        registry.with(file_layer).init();
    } else {
        registry.init();
    }
});

/// Initialize tracing and force lazy statics used in the hot path
pub fn init() {
    LazyLock::force(&LOGGING);
    LazyLock::force(&ZOBRIST);
    LazyLock::force(&crate::moves::move_gen::ATTACKS);
}
