use tracing_subscriber::EnvFilter;

/// Directives are read from this variable, e.g. `REPO_SBOM_LOG=repo_sbom=debug`.
pub const LOG_ENV: &str = "REPO_SBOM_LOG";

/// Install a stderr subscriber. `quiet` lowers the default level to `warn`;
/// an explicit `REPO_SBOM_LOG` always wins.
pub fn init(quiet: bool) {
    let result = if let Ok(directives) = std::env::var(LOG_ENV) {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new(directives))
            .event_format(
                tracing_subscriber::fmt::format()
                    .with_ansi(true)
                    .with_thread_ids(true)
                    .with_source_location(false),
            )
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new(if quiet { "warn" } else { "info" }))
            .event_format(
                tracing_subscriber::fmt::format()
                    .without_time()
                    .with_ansi(true)
                    .with_target(false)
                    .with_source_location(false),
            )
            .try_init()
    };
    // a second init (tests, embedding) keeps the first subscriber
    let _ = result;
}
