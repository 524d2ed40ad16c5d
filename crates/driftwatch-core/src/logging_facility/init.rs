//! Logging initialization

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `driftwatch=debug`
    Development,
    /// JSON structured output, `driftwatch=info`
    Production,
    /// No output; tests install the capture layer instead
    Test,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile: {}", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn filter_or(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize the logging facility
///
/// Call once at process startup. Later calls are no-ops, whatever profile
/// they pass. Output goes to stderr. `RUST_LOG` overrides the profile's
/// default filter. A subscriber installed elsewhere first (for example the
/// test capture layer) wins.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter_or("driftwatch=debug"))
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
        Profile::Production => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter_or("driftwatch=info"))
                .with_writer(std::io::stderr)
                .try_init();
        }
        Profile::Test => {
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}
