//! Networking-related utility functions

use std::time::Duration;

use log::error;
use reqwest::{header::USER_AGENT, Client};
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Timeout value, in seconds, used when checking for updates
pub(crate) static TIMEOUT: u64 = 5;

/// Creates a Reqwest Client using indicated timeout value
pub(crate) fn get_client(timeout_secs: u64) -> Result<Client> {
    let builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .use_rustls_tls();

    match builder.build() {
        Ok(client) => Ok(client),
        Err(e) => {
            error!("Failed to create HTTP Client: {e:?}");
            Err(Error::Network)
        }
    }
}

/// Retrieves and parses a JSON document from the indicated URL
pub(crate) async fn get_json<T: DeserializeOwned>(url: &str, timeout_secs: u64) -> Result<T> {
    let client = get_client(timeout_secs)?;
    let app = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    match client.get(url).header(USER_AGENT, app).send().await {
        Ok(response) => {
            let status = response.status();
            if !status.is_success() {
                error!("Received failure response from {url}: {status}");
                return Err(Error::Network);
            }
            match response.json::<T>().await {
                Ok(t) => Ok(t),
                Err(e) => {
                    error!("Failed to parse response from {url}: {e:?}");
                    Err(Error::ParseError)
                }
            }
        }
        Err(e) => {
            error!("Failed to get response from {url}: {e:?}");
            Err(Error::Network)
        }
    }
}
