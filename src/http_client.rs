use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::config::env_timeout_secs;

pub const USER_AGENT: &str = concat!("hoops-projector/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. The timeout comes from `HTTP_TIMEOUT_SECS` on first use.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(env_timeout_secs()))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
