//! Channel-based snapshot source.
//!
//! Receives snapshots via a tokio watch channel, for embedding the dashboard
//! in a process that already produces metric snapshots.

use async_trait::async_trait;
use tokio::sync::watch;

use super::{RawSnapshot, SnapshotSource};
use crate::error::SourceError;

/// A source that returns whatever snapshot was last published on a channel.
///
/// # Example
///
/// ```
/// use dashwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("embedded");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<RawSnapshot>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where snapshots come from
    pub fn new(receiver: watch::Receiver<RawSnapshot>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
        }
    }

    /// Create a channel pair for publishing snapshots to a ChannelSource.
    pub fn create(source_description: &str) -> (watch::Sender<RawSnapshot>, Self) {
        let (tx, rx) = watch::channel(RawSnapshot::default());
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

#[async_trait(?Send)]
impl SnapshotSource for ChannelSource {
    async fn fetch(&self, _interval_minutes: u32) -> Result<RawSnapshot, SourceError> {
        // Sender dropped: the held value can never change again
        if self.receiver.has_changed().is_err() {
            return Err(SourceError::Closed);
        }
        Ok(self.receiver.borrow().clone())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
