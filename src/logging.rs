use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Initialise logging at `info`, or `debug` when enabled in the settings.
/// `RUST_LOG` is only honoured in debug mode. With `log_file` set, output
/// goes to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let appender = match log_file.as_deref().map(file_appender) {
        Some(Ok(appender)) => Some(appender),
        Some(Err(e)) => {
            eprintln!("failed to open log file, logging to stderr: {e}");
            None
        }
        None => None,
    };
    let _ = match appender {
        Some(appender) => builder.with_ansi(false).with_writer(appender).try_init(),
        None => builder.try_init(),
    };
}

fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "startpage.log".to_string());
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?)
}
