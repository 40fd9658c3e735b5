use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with a console layer and a JSON file layer rotated daily.
///
/// The returned guard flushes the file writer when dropped, so the binary
/// holds it for the lifetime of the run.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let file_layer = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "wsi.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            Some((fmt::layer().json().with_writer(non_blocking_writer), guard))
        }
        Err(e) => {
            eprintln!("[logging] cannot create log directory {}: {}", log_dir.display(), e);
            None
        }
    };
    let (file_layer, guard) = match file_layer {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for this crate
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wsi=info,warn"));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    if let Err(e) = installed {
        eprintln!("[logging] subscriber already installed: {}", e);
    }

    guard
}
