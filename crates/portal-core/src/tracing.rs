use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the stdout subscriber, picked with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    /// Human-readable lines for local runs on the portal box.
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") || v.eq_ignore_ascii_case("text") => {
                Self::Pretty
            }
            _ => Self::Json,
        }
    }
}

/// Install the stdout subscriber. `RUST_LOG` wins over `default_directive`.
///
/// Returns `false` when a global subscriber was already set.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);
    match LogFormat::from_env() {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init().is_ok(),
        LogFormat::Pretty => registry.with(fmt::layer().compact()).try_init().is_ok(),
    }
}
