//! Tracing subscriber setup: console on stderr plus an optional rolling file.

use crate::cli::FILE_GUARD;
use eyre::WrapErr;
use lift_config::{Logging, Rotation};
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console filter: `RUST_LOG` wins, then `--log-level`, then `[logging].level`.
fn console_filter(cli_level: Option<&str>, cfg: &Logging) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(cli_level.or(cfg.level.as_deref()).unwrap_or("info"))
    })
}

pub fn init(json: bool, cli_level: Option<&str>, cfg: &Logging) -> eyre::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let filter = console_filter(cli_level, cfg);
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };
    layers.push(console);

    if let Some(file) = cfg.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file `{file}` has no file name"))?;
        let appender = match cfg.rotation {
            Rotation::Never => tracing_appender::rolling::never(dir, name),
            Rotation::Daily => tracing_appender::rolling::daily(dir, name),
            Rotation::Hourly => tracing_appender::rolling::hourly(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        // Keep the worker alive for the whole process.
        let _ = FILE_GUARD.set(guard);
        let level = cfg.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
