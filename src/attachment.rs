//! Receipts and logos are kept as data URLs (`data:<mime>;base64,<payload>`) so they
//! travel inside the JSON values of the store.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachment(String);

impl Attachment {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{mime};base64,{encoded}"))
    }

    /// Reads a file and embeds it. Read failures are not recovered from.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| Error::Attachment(format!("failed to read {}: {e}", path.display())))?;
        let mime = guess_mime(path);
        Ok(Self::from_bytes(&mime, &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type from the URL header, lowercased. Non data URLs report the
    /// octet-stream fallback.
    pub fn mime(&self) -> String {
        let s = self.0.trim();
        if !s.to_ascii_lowercase().starts_with("data:") {
            return FALLBACK_MIME.to_string();
        }
        let header = match s.find(',') {
            Some(comma) => &s[5..comma],
            None => &s[5..],
        };
        let media = header.split(';').next().unwrap_or("").trim();
        if media.is_empty() {
            FALLBACK_MIME.to_string()
        } else {
            media.to_ascii_lowercase()
        }
    }

    pub fn is_image(&self) -> bool {
        self.0.trim_start().to_ascii_lowercase().starts_with("data:image")
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        let s = self.0.trim();
        let comma = s
            .find(',')
            .ok_or_else(|| Error::Attachment("not a data url".to_string()))?;
        let (meta, data) = s.split_at(comma);
        if !meta.to_ascii_lowercase().contains(";base64") {
            return Err(Error::Attachment("only base64 data urls are supported".to_string()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(data[1..].trim())
            .map_err(|e| Error::Attachment(format!("invalid base64 payload: {e}")))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let bytes = self.decode()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_image() {
            "Image"
        } else if self.mime() == mime::APPLICATION_PDF.essence_str() {
            "PDF Document"
        } else {
            "Document"
        }
    }
}

fn guess_mime(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let m: mime::Mime = match ext.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    m.essence_str().to_string()
}
