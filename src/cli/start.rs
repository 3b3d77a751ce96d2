use crate::cli::{actions::Action, commands, dispatch::handler};
use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Map verbosity count to tracing level
const fn verbosity_level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Start the CLI: parse arguments, initialize logging, return the action.
///
/// # Errors
///
/// Returns an error if argument parsing, subscriber initialization, or
/// action dispatch fails.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let level = verbosity_level(matches.get_one::<u8>("verbosity").map_or(0, |&v| v));

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    // RUST_LOG=
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = Registry::default().with(fmt_layer).with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    let action = handler(&matches)?;

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_level_mapping() {
        assert_eq!(verbosity_level(0), tracing::Level::ERROR);
        assert_eq!(verbosity_level(1), tracing::Level::WARN);
        assert_eq!(verbosity_level(2), tracing::Level::INFO);
        assert_eq!(verbosity_level(3), tracing::Level::DEBUG);
        assert_eq!(verbosity_level(4), tracing::Level::TRACE);
        assert_eq!(verbosity_level(9), tracing::Level::TRACE);
    }
}
