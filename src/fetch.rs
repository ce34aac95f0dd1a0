//! Installer image download.
//!
//! One rule governs the destination path: either the complete resource
//! is there, or nothing is. The body streams into a `.part` file that is
//! renamed into place only after every declared byte has arrived; any
//! failure removes it.

use std::path::Path;

use futures_util::StreamExt;
use indicatif::ProgressBar;
use tokio::io::AsyncWriteExt;

use crate::error::GuestctlError;
use crate::progress::DownloadProgress;

/// Ensure a complete local copy of `url` exists at `dest`.
///
/// If `dest` already exists the call is a no-op: no request is made and
/// nothing is written. The existing file is taken at face value; there
/// is no checksum to verify it against.
pub async fn ensure_installer(url: &str, dest: &Path) -> Result<(), GuestctlError> {
    if dest.exists() {
        println!("Installer already downloaded, skipping.");
        tracing::debug!(path = %dest.display(), "installer present, not fetching");
        return Ok(());
    }

    tracing::info!(url, "downloading installer image");
    println!("Downloading installer...");

    let response = reqwest::get(url).await.map_err(|e| GuestctlError::Download {
        message: format!("request to {url} failed"),
        source: Box::new(e),
    })?;

    if !response.status().is_success() {
        return Err(GuestctlError::TransferFailed {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    // Headers are in; the declared length (if any) sizes the bar.
    let total = response.content_length();
    let mut progress = DownloadProgress::new(total);
    let bar = crate::progress::transfer_bar(total);

    let tmp = dest.with_extension("part");

    // Remove any stale .part file from a previous failed download
    let _ = tokio::fs::remove_file(&tmp).await;

    if let Err(e) = stream_to_file(&tmp, response, &mut progress, &bar).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    if !progress.is_complete() {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(GuestctlError::Download {
            message: format!(
                "connection closed after {} of {} bytes",
                progress.received(),
                progress.total().unwrap_or(0),
            ),
            source: "truncated response body".into(),
        });
    }

    tokio::fs::rename(&tmp, dest)
        .await
        .map_err(|e| GuestctlError::Io {
            context: format!("renaming {} to {}", tmp.display(), dest.display()),
            source: e,
        })?;

    bar.finish();
    tracing::info!(path = %dest.display(), "installer image downloaded");
    Ok(())
}

/// Stream the response body to `path` chunk by chunk, advancing the
/// counters and the bar as each chunk lands.
async fn stream_to_file(
    path: &Path,
    response: reqwest::Response,
    progress: &mut DownloadProgress,
    bar: &ProgressBar,
) -> Result<(), GuestctlError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| GuestctlError::Io {
            context: format!("creating {}", path.display()),
            source: e,
        })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GuestctlError::Download {
            message: "error reading response body".into(),
            source: Box::new(e),
        })?;
        file.write_all(&chunk).await.map_err(|e| GuestctlError::Io {
            context: "writing installer data".into(),
            source: e,
        })?;
        progress.advance(chunk.len() as u64);
        bar.set_position(progress.received());
    }

    file.flush().await.map_err(|e| GuestctlError::Io {
        context: "flushing installer file".into(),
        source: e,
    })?;

    Ok(())
}
