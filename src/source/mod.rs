//! Snapshot sources.
//!
//! A source produces one [`RawSnapshot`] per fetch. The poller owns a boxed
//! source and drives it on a timer; sources never retry on their own.

mod channel;
mod exposition;
mod file;
mod http;
mod snapshot;

pub use channel::ChannelSource;
pub use exposition::{parse_exposition, ExpositionDecoder};
pub use file::FileSource;
pub use http::HttpSource;
pub use snapshot::{Prominent, RawSnapshot, WirePoint, WireThresholds};

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SourceError;

/// Payload encoding served by a file or HTTP source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// The dashboard snapshot JSON document.
    #[default]
    Json,
    /// Prometheus text exposition.
    Prometheus,
}

/// Something that can produce metric snapshots.
///
/// Fetches run on a single-threaded runtime, so futures need not be `Send`.
#[async_trait(?Send)]
pub trait SnapshotSource: Debug {
    /// Fetch the current snapshot with a history window of `interval_minutes`.
    async fn fetch(&self, interval_minutes: u32) -> Result<RawSnapshot, SourceError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}

/// Decodes payload text according to a [`PayloadFormat`].
///
/// Exposition text carries no history, so the decoder keeps a rolling window
/// across fetches and attaches it to each snapshot.
#[derive(Debug, Default)]
pub(crate) struct PayloadDecoder {
    format: PayloadFormat,
    exposition: ExpositionDecoder,
}

impl PayloadDecoder {
    pub(crate) fn new(format: PayloadFormat) -> Self {
        Self {
            format,
            exposition: ExpositionDecoder::default(),
        }
    }

    pub(crate) fn format(&self) -> PayloadFormat {
        self.format
    }

    pub(crate) fn decode(&self, body: &str) -> Result<RawSnapshot, SourceError> {
        match self.format {
            PayloadFormat::Json => Ok(serde_json::from_str(body)?),
            PayloadFormat::Prometheus => Ok(self.exposition.decode(body, unix_now())),
        }
    }
}

/// Current wall clock time in epoch seconds.
pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
