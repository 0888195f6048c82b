pub mod check_config;
pub mod send;
pub mod serve;

pub use check_config::CheckConfigCommand;
pub use send::SendCommand;
pub use serve::ServeCommand;

use anyhow::Context;
use mailgate_config::GatewayConfig;
use std::path::Path;

/// Load and validate the gateway configuration, file first then environment
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<GatewayConfig> {
    GatewayConfig::load(path).context("Failed to load mail gateway configuration")
}
