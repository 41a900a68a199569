//! Per-account OAuth tokens, stored at
//! `<config_dir>/calsync/google/tokens/<account>.json` and refreshed when expired.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app_config::{self, base_dir};

pub struct Session {
    path: PathBuf,
    data: SessionData,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl From<&AccessToken> for SessionData {
    fn from(tokens: &AccessToken) -> Self {
        SessionData {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
        }
    }
}

impl Session {
    fn path_for_account(account: &str) -> Result<PathBuf> {
        Ok(base_dir()?.join("tokens").join(token_file_name(account)))
    }

    pub fn new(account: &str, data: SessionData) -> Result<Self> {
        Ok(Session {
            path: Self::path_for_account(account)?,
            data,
        })
    }

    /// Load the account's tokens, refreshing and saving them if expired.
    pub async fn load_valid(account: &str) -> Result<Self> {
        let mut session = Self::load_from(&Self::path_for_account(account)?)
            .with_context(|| format!("Run `calsync auth {}` first", account))?;

        if session.is_expired() {
            debug!(account, "Access token expired, refreshing");
            session.refresh().await?;
        }
        Ok(session)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Google OAuth tokens not found at {}", path.display());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Google OAuth tokens from {}", path.display()))?;

        let data: SessionData = serde_json::from_str(&contents).with_context(|| {
            format!("Failed to parse Google OAuth tokens from {}", path.display())
        })?;

        Ok(Session {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn save(&self) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize tokens")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write tokens to {}", self.path.display()))?;

        // Owner-only, the file holds OAuth tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    pub fn client(&self) -> Result<Client> {
        let creds = app_config::load()?;
        Ok(Client::new(
            creds.client_id,
            creds.client_secret,
            String::new(),
            self.data.access_token.clone(),
            self.data.refresh_token.clone(),
        ))
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<()> {
        let client = self.client()?;

        let mut tokens = client
            .refresh_access_token()
            .await
            .context("Failed to refresh Google access token")?;

        // Google usually keeps the refresh token and returns an empty one.
        if tokens.refresh_token.is_empty() {
            tokens.refresh_token = self.data.refresh_token.clone();
        }

        self.data = (&tokens).into();
        self.save()
    }
}

fn token_file_name(account: &str) -> String {
    format!("{}.json", account.replace(['/', '\\', ':'], "_"))
}
