//! Tracing setup shared by both binaries
//!
//! The subscriber is installed before the config file is read so that
//! config loading is logged. It starts at `RUST_LOG` (or `info`); once the
//! config is loaded, [`LogFilter::apply_config_level`] switches to the
//! configured `[logging] level` unless `RUST_LOG` was set.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

use crate::{Error, Result};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle to the installed level filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// True when `RUST_LOG` picked the filter
    pub fn is_from_env(&self) -> bool {
        self.from_env
    }

    /// Switch to the configured level; `RUST_LOG` wins when set
    pub fn apply_config_level(&self, level: &str) -> Result<()> {
        if self.from_env {
            return Ok(());
        }

        let filter = EnvFilter::try_new(level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", level, e)))?;
        self.handle
            .reload(filter)
            .map_err(|e| Error::Config(format!("Failed to apply log level: {}", e)))
    }
}

/// Build the subscriber without installing it
pub fn subscriber<W>(writer: W) -> (impl Subscriber + Send + Sync + 'static, LogFilter)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env();
    let from_env = env_filter.is_ok();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));

    (subscriber, LogFilter { handle, from_env })
}

/// Install the global subscriber writing to `writer`
pub fn init<W>(writer: W) -> LogFilter
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (subscriber, filter) = subscriber(writer);
    subscriber.init();
    filter
}
