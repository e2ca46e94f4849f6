//! Reference image acquisition

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use worksheet_synth::{SynthError, constants::MAX_REFERENCE_BYTES};

type Result<T> = std::result::Result<T, SynthError>;

/// Where a reference image comes from
#[derive(Debug, Clone)]
pub enum ReferenceSource {
    Bytes(Vec<u8>),
    File(PathBuf),
    Url(String),
}

const LOCAL_FILE_GUIDANCE: &str = "download the image and use a local file instead";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on a whole fetch, body included
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch the raw bytes of a reference image. Decoding is left to the caller.
pub async fn acquire_reference(source: ReferenceSource) -> Result<Vec<u8>> {
    match source {
        ReferenceSource::Bytes(bytes) => Ok(bytes),
        ReferenceSource::File(path) => {
            log::debug!("Reading reference image {}", path.display());
            Ok(tokio::fs::read(&path).await?)
        }
        ReferenceSource::Url(url) => {
            log::info!("Fetching reference image {}", url);
            tokio::task::spawn_blocking(move || fetch_url(&url)).await?
        }
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let failure = |detail: String| {
        SynthError::NetworkAcquisitionFailure(format!(
            "Could not fetch {} ({}); {}",
            url, detail, LOCAL_FILE_GUIDANCE
        ))
    };

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout(FETCH_TIMEOUT)
        .build();
    let response = agent.get(url).call().map_err(|e| failure(e.to_string()))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_REFERENCE_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| failure(e.to_string()))?;

    if bytes.len() as u64 > MAX_REFERENCE_BYTES {
        return Err(failure("image is too large".to_string()));
    }
    if bytes.is_empty() {
        return Err(failure("empty response".to_string()));
    }
    Ok(bytes)
}
