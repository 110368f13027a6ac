//! Audio duration probing
//!
//! Only container headers are read: duration is the default track's frame
//! count over its sample rate. Files symphonia cannot probe, or whose header
//! carries no frame count, yield `None` and the poller falls back to its
//! default budget.

use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Duration in seconds, or `None` (with a warning) when it cannot be read
pub fn probe_duration(path: &Path) -> Option<f64> {
    match read_duration(path) {
        Ok(secs) => {
            debug!(path = %path.display(), duration_secs = secs, "Probed duration");
            Some(secs)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{:#}", e), "Could not determine file duration");
            None
        }
    }
}

fn read_duration(path: &Path) -> Result<f64> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unsupported or corrupt audio container")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let params = &track.codec_params;
    let frames = params.n_frames.context("Frame count unknown")?;
    let sample_rate = params.sample_rate.context("Sample rate unknown")?;
    if sample_rate == 0 {
        anyhow::bail!("Sample rate is zero");
    }

    Ok(frames as f64 / f64::from(sample_rate))
}
