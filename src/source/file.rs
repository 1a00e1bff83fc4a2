//! File-based snapshot source.
//!
//! Reads a snapshot file on every fetch. Useful for replaying captured
//! backend responses or scraping a node exporter textfile.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{PayloadDecoder, PayloadFormat, RawSnapshot, SnapshotSource};
use crate::error::SourceError;

/// A source that reads snapshots from a JSON or exposition file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    decoder: PayloadDecoder,
}

impl FileSource {
    /// Create a new JSON file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_format(path, PayloadFormat::Json)
    }

    pub fn with_format<P: AsRef<Path>>(path: P, format: PayloadFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            decoder: PayloadDecoder::new(format),
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> PayloadFormat {
        self.decoder.format()
    }
}

#[async_trait(?Send)]
impl SnapshotSource for FileSource {
    async fn fetch(&self, _interval_minutes: u32) -> Result<RawSnapshot, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        self.decoder.decode(&content)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "values": {"tx_pool_size": 42, "process_cpu_usage": "0.5"},
            "thresholds": {"tx_pool_size": {"warning": 1000, "critical": 5000}}
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/snapshot.json");
        assert_eq!(source.path(), Path::new("/tmp/snapshot.json"));
        assert_eq!(source.description(), "file: /tmp/snapshot.json");
        assert_eq!(source.format(), PayloadFormat::Json);
    }

    #[tokio::test]
    async fn test_file_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let source = FileSource::new(file.path());
        let snapshot = source.fetch(30).await.unwrap();
        assert_eq!(snapshot.values.len(), 2);
        assert!(snapshot.thresholds.contains_key("tx_pool_size"));
    }

    #[tokio::test]
    async fn test_file_source_sees_rewrites() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();
        let source = FileSource::new(file.path());
        source.fetch(30).await.unwrap();

        file.as_file().set_len(0).unwrap();
        file.rewind().unwrap();
        writeln!(file, r#"{{"values": {{"system_load_average_1m": 1.25}}}}"#).unwrap();
        file.flush().unwrap();

        let snapshot = source.fetch(30).await.unwrap();
        assert_eq!(snapshot.values.len(), 1);
        assert!(snapshot.values.contains_key("system_load_average_1m"));
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent/path/snapshot.json");
        let err = source.fetch(30).await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
        assert!(err.to_string().contains("Read error"));
    }

    #[tokio::test]
    async fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let source = FileSource::new(file.path());
        let err = source.fetch(30).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_file_source_exposition_keeps_history() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tx_pool_size 5").unwrap();

        let source = FileSource::with_format(file.path(), PayloadFormat::Prometheus);
        source.fetch(30).await.unwrap();
        let snapshot = source.fetch(30).await.unwrap();
        assert_eq!(snapshot.history["tx_pool_size"].len(), 2);
        assert!(snapshot.last_updated.is_some());
    }
}
