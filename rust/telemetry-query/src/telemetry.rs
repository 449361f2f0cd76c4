use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "warn,telemetry_query=info";

static SUBSCRIBER: OnceCell<bool> = OnceCell::new();

/// Installs the global subscriber on first call and reports whether this crate owns it.
///
/// Output goes to stderr because stdout carries the translated request. When the embedding
/// process already installed a subscriber, that one is left in place.
pub fn init_tracing() -> bool {
    *SUBSCRIBER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init()
            .is_ok()
    })
}
