use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to JSON with a warning on stderr, since the
    /// subscriber is not installed yet.
    pub fn parse(format: &str) -> Self {
        match format.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "compact" | "text" => Self::Pretty,
            _ => {
                eprintln!(
                    "WARN: Invalid log format '{}', defaulting to 'json'. Valid options: json, pretty",
                    format
                );
                Self::Json
            }
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `log_level`.
pub fn init(log_format: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let format = LogFormat::parse(log_format);
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr)
                    .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339()),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    tracing::debug!(
        log_format = ?format,
        log_level = log_level,
        "Logging system initialized"
    );
}
