use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    /// Trailer appended after the body. CSV and JSON put the digest behind a
    /// comment marker so the body above it stays parseable.
    fn seal_line(&self, digest: &str) -> String {
        match self {
            ExportFormat::Text => format!("\n\nSHA-256: {digest}"),
            ExportFormat::Csv => format!("\n# SHA-256: {digest}"),
            ExportFormat::Json => format!("\n// SHA-256: {digest}"),
        }
    }

    /// Lowercase format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Lowercase hex SHA-256 of the exact text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}


/// An export body and the digest that seals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedExport {
    pub format: ExportFormat,
    pub body: String,
    pub digest: String,
}

impl SealedExport {
    /// Hash `body` and keep both.
    pub fn seal(format: ExportFormat, body: String) -> Self {
        let digest = content_hash(&body);
        SealedExport {
            format,
            body,
            digest,
        }
    }

    /// True if `body` still hashes to the recorded digest.
    pub fn verify(&self) -> bool {
        content_hash(&self.body) == self.digest
    }
}


/// Body followed by its seal line.
impl fmt::Display for SealedExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)?;
        f.write_str(&self.format.seal_line(&self.digest))
    }
}
