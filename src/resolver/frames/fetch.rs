// Bounded prefix download

use futures_util::StreamExt;
use reqwest::header::RANGE;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::resolver::errors::SamplerError;

/// Bytes needed to cover `offsets` plus a safety margin, capped at `ceiling`
pub fn prefix_budget(offsets: &[f64], bytes_per_second: u64, margin_seconds: f64, ceiling: u64) -> u64 {
    let max_offset = offsets
        .iter()
        .copied()
        .filter(|o| o.is_finite() && *o >= 0.0)
        .fold(0.0_f64, f64::max);
    let seconds = max_offset + margin_seconds.max(0.0);
    let wanted = (seconds * bytes_per_second as f64).ceil() as u64;

    wanted.max(1).min(ceiling.max(1))
}

/// Stream at most `max_bytes` of `url` into `dest`, discarding the rest.
///
/// Asks for a byte range; servers that ignore it are cut off client-side.
pub async fn fetch_prefix(
    client: &reqwest::Client,
    url: &str,
    max_bytes: u64,
    dest: &Path,
) -> Result<u64, SamplerError> {
    let max_bytes = max_bytes.max(1);
    let response = client
        .get(url)
        .header(RANGE, format!("bytes=0-{}", max_bytes - 1))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SamplerError::Status(status.as_u16()));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let remaining = max_bytes - written;
        let take = (chunk.len() as u64).min(remaining) as usize;
        file.write_all(&chunk[..take]).await?;
        written += take as u64;

        if written >= max_bytes {
            break;
        }
    }
    file.flush().await?;

    debug!(url, written, status = status.as_u16(), "Prefix downloaded");
    Ok(written)
}
