use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this before any fallible operations so error reports carry
/// file:line locations. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): JSON lines with flattened events
///   and no module targets, for log aggregation.
/// - **Development** (default): pretty-printed, human-readable output.
///
/// Both modes install `tracing_error::ErrorLayer` so spans are captured into
/// error reports. `RUST_LOG` overrides the default filter (`info` in
/// production, `debug` in development).
///
/// Safe to call multiple times: if a subscriber is already set (common in
/// tests), the call is a no-op.
pub fn init_tracing(environment: &Environment) {
    install_color_eyre();

    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("debug")
        }
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                "Tracing initialized with ErrorLayer. Environment: {:?}",
                environment
            );
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_development() {
        let env = Environment::Development;
        // Should not panic
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_production() {
        let env = Environment::Production;
        // Should not panic
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        // Should not panic when called multiple times
        let env = Environment::Development;
        init_tracing(&env);
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            let env = Environment::Development;
            init_tracing(&env);
        });
    }
}
