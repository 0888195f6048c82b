use anyhow::Context;
use clap::Args;
use colored::Colorize;
use mailgate_email::{Attachment, DispatchService, EmailError, Message};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Args)]
pub struct SendCommand {
    /// JSON file holding the message (from, to, cc, bcc, subject, message)
    #[arg(long)]
    pub params: PathBuf,

    /// File to attach; repeat for more than one
    #[arg(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "MAILGATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Parse the message file the same way the gateway parses `email_params`
fn read_params(path: &Path) -> anyhow::Result<Message> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if contents.trim().is_empty() {
        return Err(EmailError::MissingParams.into());
    }

    serde_json::from_str(&contents).map_err(|e| {
        error!("{} is not a valid message: {}", path.display(), e);
        EmailError::InvalidParams.into()
    })
}

impl SendCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let message = read_params(&self.params)?;
        let attachments: Vec<Attachment> =
            self.attachments.iter().map(Attachment::from_path).collect();
        for attachment in &attachments {
            debug!(
                "Attaching {} as {}",
                attachment.filename, attachment.content_type
            );
        }

        let dispatch_service = DispatchService::from_config(&config)?;

        let rt = tokio::runtime::Runtime::new()?;
        match rt.block_on(dispatch_service.send(&message, &attachments)) {
            Ok(receipt) => {
                println!(
                    "{} {} (provider #{}, {} attempt(s))",
                    "✓ Queued through".bright_green(),
                    receipt.provider.to_string().bright_white().bold(),
                    receipt.provider_index,
                    receipt.attempts
                );
                Ok(())
            }
            Err(e) => Err(send_failure(e)),
        }
    }
}

/// Reported once by `main`: the code in the context, the message as the cause
fn send_failure(err: EmailError) -> anyhow::Error {
    let code = err.error_code();
    anyhow::Error::new(err).context(format!("Send failed [{}]", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.json");
        std::fs::write(
            &path,
            r#"{"from":{"email":"a@x.com"},"to":[{"email":"b@x.com"}],"subject":"S","message":"B"}"#,
        )
        .unwrap();

        let message = read_params(&path).unwrap();
        assert_eq!(message.to[0].email, "b@x.com");
        assert_eq!(message.body, "B");
    }

    #[test]
    fn test_read_params_blank_and_malformed() {
        let dir = tempfile::tempdir().unwrap();

        let blank = dir.path().join("blank.json");
        std::fs::write(&blank, "  \n").unwrap();
        let err = read_params(&blank).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EmailError>(),
            Some(&EmailError::MissingParams)
        );

        let malformed = dir.path().join("bad.json");
        std::fs::write(&malformed, "{\"to\": 5").unwrap();
        let err = read_params(&malformed).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EmailError>(),
            Some(&EmailError::InvalidParams)
        );
    }

    #[test]
    fn test_send_failure_reports_message_once() {
        let err = send_failure(EmailError::MissingTo);

        assert_eq!(err.to_string(), "Send failed [MISSING_TO]");
        assert_eq!(
            err.downcast_ref::<EmailError>(),
            Some(&EmailError::MissingTo)
        );

        let report = format!("{:?}", err);
        assert_eq!(report.matches("To recipients not given.").count(), 1);
        assert_eq!(report.matches("MISSING_TO").count(), 1);
    }

    #[test]
    fn test_read_params_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_params(&dir.path().join("nope.json")).is_err());
    }
}
