//! Shared per-file inspection: read, classify, detect.
//!
//! The processor and the modifier both go through [`FileInspector`], so a
//! file is classified and matched identically whether it is being scanned or
//! cleaned.

use std::fs::File;
use std::io::{BufReader, Read};

use camino::Utf8Path;
use el_core::{DetectionResult, ProcessingConfig};
use el_detect::{BinaryReason, Classification, Detector, TextClassifier};

use crate::error::ScanError;

/// What a file turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// Text content with its matches, before allowlist filtering.
    Text {
        /// The bytes read.
        content: Vec<u8>,
        /// Every match in `content`.
        detection: DetectionResult,
    },
    /// Binary content; nothing was detected.
    Binary(BinaryReason),
}

/// Reads files within the size limit, classifies them, and detects matches.
#[derive(Debug, Clone)]
pub struct FileInspector {
    detector: Detector,
    classifier: TextClassifier,
    max_file_size: Option<u64>,
    buffer_size: usize,
}

impl FileInspector {
    /// Creates an inspector using the size and buffer settings of `config`.
    #[must_use]
    pub fn new(detector: Detector, classifier: TextClassifier, config: &ProcessingConfig) -> Self {
        Self {
            detector,
            classifier,
            max_file_size: config.size_limit(),
            buffer_size: config.buffer_size.max(1),
        }
    }

    /// The detector in use.
    #[inline]
    #[must_use]
    pub const fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Reads `path`, never buffering more than one byte past the limit.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Access`] if the file cannot be opened or read and
    /// [`ScanError::Oversized`] if it exceeds the limit.
    pub fn read(&self, path: &Utf8Path) -> Result<Vec<u8>, ScanError> {
        let file = File::open(path).map_err(|e| ScanError::access(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| ScanError::access(path, e))?
            .len();

        let capacity = match self.max_file_size {
            Some(limit) if len > limit => return Err(ScanError::oversized(path, len, limit)),
            Some(limit) => len.min(limit),
            None => len,
        };

        let mut content = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
        let reader = BufReader::with_capacity(self.buffer_size, file);
        match self.max_file_size {
            Some(limit) => {
                reader
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut content)
                    .map_err(|e| ScanError::access(path, e))?;
                let read = content.len() as u64;
                if read > limit {
                    // The file grew after the metadata check.
                    return Err(ScanError::oversized(path, read, limit));
                }
            }
            None => {
                let mut reader = reader;
                reader
                    .read_to_end(&mut content)
                    .map_err(|e| ScanError::access(path, e))?;
            }
        }
        Ok(content)
    }

    /// Classifies and detects already-read content.
    #[must_use]
    pub fn inspect_bytes(&self, content: Vec<u8>) -> Inspection {
        match self.classifier.classify(&content) {
            Classification::Binary(reason) => Inspection::Binary(reason),
            Classification::Text => {
                let detection = self.detector.detect(&content);
                Inspection::Text { content, detection }
            }
        }
    }

    /// Reads and inspects `path`.
    pub fn inspect(&self, path: &Utf8Path) -> Result<Inspection, ScanError> {
        Ok(self.inspect_bytes(self.read(path)?))
    }
}
