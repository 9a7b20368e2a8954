use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn env_filter() -> EnvFilter {
    // RUST_LOG wins; info otherwise.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON logs for the server, one flattened object per event with the current span attached.
pub fn init_tracing() -> anyhow::Result<()> {
    let fmt_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true);

    Registry::default()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Compact logs on stderr so stdout stays free for the rendered dashboard.
pub fn init_cli_tracing() -> anyhow::Result<()> {
    let fmt_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    Registry::default()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
