use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, events are written to stdout.
///
/// `levels` takes `EnvFilter` directives, e.g. `info` or
/// `flowtrace::netflow=debug`, invalid directives fall back to `info`.
pub fn init(color: bool, json: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time();

    // tests might initialize it more than once
    let _ = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.with_ansi(color).try_init()
    };
}
