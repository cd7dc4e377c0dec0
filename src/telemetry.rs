use tracing_subscriber::{
    EnvFilter, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "menu_qr=debug,tower_http=info";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer()
        .event_format(Format::default().compact().with_target(false));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(console_fmt)
        .init();
}
