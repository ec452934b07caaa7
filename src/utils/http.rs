// src/utils/http.rs

//! Feed retrieval utilities.

use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch the raw feed document from an `http(s)://` or `file://` URL.
///
/// The whole attempt, including reading the body, is bounded by
/// `timeout_secs`.
pub async fn fetch_feed(client: &reqwest::Client, feed: &str, timeout_secs: u64) -> Result<Vec<u8>> {
    let url = Url::parse(feed)?;
    let deadline = Duration::from_secs(timeout_secs);

    tokio::time::timeout(deadline, read_feed(client, &url))
        .await
        .map_err(|_| AppError::timeout(feed, timeout_secs))?
}

async fn read_feed(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>> {
    match url.scheme() {
        "http" | "https" => {
            let response = client.get(url.clone()).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| AppError::config(format!("Invalid file URL: {url}")))?;
            Ok(tokio::fs::read(&path).await?)
        }
        other => Err(AppError::UnsupportedScheme(other.to_string())),
    }
}
