//! Format signatures for downloaded results.
//!
//! Result objects carry no content type, so the format is guessed from the
//! leading bytes. A [`FormatTable`] is an ordered list of signatures; the
//! first one whose magic prefix matches wins. Longer magic prefixes are kept
//! ahead of shorter ones so a more specific signature is never shadowed.

use std::path::Path;

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;

/// Number of leading bytes inspected by the standard table
pub const HEADER_LEN: usize = 4;

/// A byte-prefix pattern identifying a file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSignature {
    pub name: &'static str,
    pub magic: &'static [u8],
    /// Canonical extension without the leading dot
    pub extension: &'static str,
}

impl FormatSignature {
    pub const fn new(name: &'static str, magic: &'static [u8], extension: &'static str) -> Self {
        Self {
            name,
            magic,
            extension,
        }
    }

    pub fn matches(&self, header: &[u8]) -> bool {
        header.starts_with(self.magic)
    }
}

/// ZIP local file header
pub const ZIP_SIGNATURE: FormatSignature = FormatSignature::new("ZIP", b"PK\x03\x04", "zip");

/// XML declaration (`<?xml`)
pub const XML_SIGNATURE: FormatSignature = FormatSignature::new("XML", b"<?xm", "xml");

/// Extensions accepted as already correct even without a signature
const PASSTHROUGH_EXTENSIONS: [&str; 1] = ["pdf"];

/// Ordered signature table plus the set of canonical extensions
#[derive(Debug, Clone)]
pub struct FormatTable {
    signatures: Vec<FormatSignature>,
    canonical_extensions: Vec<String>,
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormatTable {
    /// Table with no signatures and no canonical extensions
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
            canonical_extensions: Vec::new(),
        }
    }

    /// ZIP and XML signatures; `xml`, `pdf` and `zip` count as canonical
    pub fn standard() -> Self {
        let mut table = Self::empty()
            .with_signature(ZIP_SIGNATURE)
            .with_signature(XML_SIGNATURE);
        for extension in PASSTHROUGH_EXTENSIONS {
            table = table.with_canonical_extension(extension);
        }
        table
    }

    /// Add a signature, keeping longer magic prefixes first
    ///
    /// Among signatures of equal length, earlier insertions stay first.
    pub fn with_signature(mut self, signature: FormatSignature) -> Self {
        let position = self
            .signatures
            .iter()
            .position(|existing| existing.magic.len() < signature.magic.len())
            .unwrap_or(self.signatures.len());
        self.signatures.insert(position, signature);
        self.with_canonical_extension(signature.extension)
    }

    /// Mark an extension as canonical without adding a signature for it
    pub fn with_canonical_extension(mut self, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if !self.canonical_extensions.contains(&extension) {
            self.canonical_extensions.push(extension);
        }
        self
    }

    pub fn signatures(&self) -> &[FormatSignature] {
        &self.signatures
    }

    /// Number of leading bytes needed to evaluate every signature
    pub fn header_len(&self) -> usize {
        self.signatures
            .iter()
            .map(|s| s.magic.len())
            .max()
            .unwrap_or(0)
            .max(HEADER_LEN)
    }

    /// First signature whose magic prefixes `header`
    pub fn classify(&self, header: &[u8]) -> Option<&FormatSignature> {
        self.signatures.iter().find(|s| s.matches(header))
    }

    /// Whether `extension` (case-insensitive, with or without dot) is canonical
    pub fn is_canonical_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.canonical_extensions.contains(&extension)
    }

    /// Classification only runs for paths without a canonical extension
    pub fn needs_classification(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(extension) if !extension.is_empty() => !self.is_canonical_extension(extension),
            _ => true,
        }
    }
}
