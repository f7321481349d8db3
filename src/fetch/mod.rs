// src/fetch/mod.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use url::Url;

/// Download the feed at `url_str` and save it to `dest`, creating parent
/// directories as needed. Returns the path written.
#[tracing::instrument(level = "info", skip(client, dest), fields(dest = %dest.as_ref().display()))]
pub async fn download_feed(
    client: &Client,
    url_str: &str,
    dest: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_path = dest.as_ref().to_path_buf();
    let url = Url::parse(url_str).with_context(|| format!("parsing feed URL {}", url_str))?;

    if let Some(parent) = dest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {:?}", parent))?;
    }

    let bytes = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {:?}", dest_path))?;

    info!(bytes = bytes.len(), "feed downloaded");
    Ok(dest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_feed(&Client::new(), "not a url", dir.path().join("feed.xml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("parsing feed URL"));
        assert!(!dir.path().join("feed.xml").exists());
    }
}
