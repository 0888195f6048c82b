mod provider;
mod service;

pub use provider::{ProviderConfig, ProviderKind};
pub use service::{ConfigError, GatewayConfig, SendLimits, CONFIG_ENV_PREFIX};
