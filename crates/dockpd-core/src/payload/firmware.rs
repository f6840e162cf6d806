//! Firmware artifact handed to the update pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("Firmware artifact carries no payload")]
    NoPayload,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An immutable firmware image plus an advisory version string.
///
/// The core never inspects or mutates the payload; validation is the
/// supplier's responsibility.
#[derive(Debug, Clone, Default)]
pub struct PdFirmware {
    payload: Option<Vec<u8>>,
    version: Option<String>,
}

impl PdFirmware {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            version: None,
        }
    }

    /// An artifact with no payload; `bytes()` fails. Useful for callers
    /// that resolve metadata before the image itself is available.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, FirmwareError> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// The raw image bytes.
    pub fn bytes(&self) -> Result<&[u8], FirmwareError> {
        self.payload.as_deref().ok_or(FirmwareError::NoPayload)
    }

    /// Advisory version string, for diagnostics only.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
