use tracing_subscriber::EnvFilter;

/// Installs the JSON log subscriber. Filtering follows `RUST_LOG`, defaulting
/// to `info`.
pub fn init() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_current_span(false)
        .try_init()
}
