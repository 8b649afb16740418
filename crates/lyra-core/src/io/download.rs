//! Idempotent remote fetch and reachability probing.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;

/// Download a remote resource to `dest`, streaming the body to disk.
///
/// Idempotent: a no-op when the destination already exists. Parent
/// directories are created. The body is staged into a sibling `.part` file
/// and renamed into place once the stream completes, so `dest` only ever
/// holds a whole file; an interrupted transfer leaves nothing behind and a
/// later call retries.
///
/// # Errors
///
/// Returns an error on a non-success HTTP status or any filesystem failure.
pub async fn download(client: &Client, dest: &Path, url: &str) -> Result<(), DownloadError> {
    if dest.exists() {
        tracing::debug!(dest = %dest.display(), "already cached, skipping download");
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::info!(url, dest = %dest.display(), "downloading");
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let staging = dest.with_extension("part");
    if let Err(err) = write_body(response, &staging).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    tokio::fs::rename(&staging, dest).await?;

    Ok(())
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<(), DownloadError> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Returns true if a resource at the given endpoint is reachable without
/// downloading the file. Uses a ranged GET so only the first bytes transfer.
pub async fn ping(client: &Client, url: &str) -> bool {
    let request = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .header(reqwest::header::RANGE, "bytes=0-5");
    match request.send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
