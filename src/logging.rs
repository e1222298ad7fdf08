// Tracing subscriber setup for binaries embedding the resolver

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber.
///
/// `RUST_LOG` overrides the default `info` level; `LOG_FORMAT=json` (or
/// `json = true`) switches to JSON lines. Safe to call more than once: later
/// calls are no-ops.
pub fn init_tracing(json: bool) {
    let use_json = json
        || std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing(false);
        init_tracing(true);
        tracing::info!("still logging");
    }
}
