use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckConfigCommand {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "MAILGATE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl CheckConfigCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = super::load_config(self.config.as_deref())?;

        println!("{}", "✓ Configuration is valid".bright_green());
        println!("  address:        {}", config.address);
        println!("  http timeout:   {}s", config.http_timeout_secs);
        println!("  max recipients: {}", config.limits.max_recipients);
        println!("  max mail size:  {} bytes", config.limits.max_mail_size);
        println!();
        println!("{}", "Providers, in failover order:".bright_white().bold());

        for (index, provider) in config.providers.iter().enumerate() {
            // validate() already resolved every service name
            let kind = provider
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|_| provider.service_name.clone());
            println!(
                "  {}. {:<9} {}  key={}  timeout={}s",
                index + 1,
                kind.cyan(),
                provider.endpoint,
                provider.redacted_api_key(),
                provider.timeout(config.http_timeout_secs).as_secs()
            );
        }

        Ok(())
    }
}
