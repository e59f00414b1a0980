use anyhow::{Context, Result, bail};

/// Channel credentials, read once at startup and immutable afterwards.
///
/// The secret authenticates inbound webhooks; the access token authenticates
/// outbound messaging API calls.
#[derive(Debug, Clone)]
pub struct Config {
    pub channel_secret: String,
    pub channel_access_token: String,
}

impl Config {
    /// Load credentials from `LINE_CHANNEL_SECRET` and
    /// `LINE_CHANNEL_ACCESS_TOKEN`. Both are required; the process must fail
    /// before binding a port when either is absent.
    pub fn from_env() -> Result<Self> {
        let channel_secret = std::env::var("LINE_CHANNEL_SECRET")
            .context("LINE_CHANNEL_SECRET must be set in the environment")?;
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .context("LINE_CHANNEL_ACCESS_TOKEN must be set in the environment")?;
        if channel_secret.trim().is_empty() || channel_access_token.trim().is_empty() {
            bail!("LINE_CHANNEL_SECRET and LINE_CHANNEL_ACCESS_TOKEN must not be empty");
        }
        Ok(Self {
            channel_secret,
            channel_access_token,
        })
    }
}
