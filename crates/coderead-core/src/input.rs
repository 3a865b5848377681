//! Code input loading: pasted text or an image of code.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Maximum image size accepted for inline upload (15 MB raw).
///
/// Gemini caps a whole request at 20 MB and base64 grows data by a third.
const MAX_IMAGE_BYTES: u64 = 15 * 1024 * 1024;

/// Image MIME types Gemini accepts as inline data.
const SUPPORTED_IMAGE_MIMES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
    "image/gif",
];

pub const INVALID_IMAGE_MESSAGE: &str = "Please upload a valid image file.";

/// An image attached for analysis, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub path: PathBuf,
    pub mime_type: String,
    pub data: String,
}

/// What gets sent to the model alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeInput {
    Text(String),
    Image(ImageInput),
}

/// Reads code text from a file, or from stdin when `path` is `None` or `-`.
///
/// # Errors
/// Returns an error if the file or stdin cannot be read as UTF-8.
pub fn read_code(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read code from stdin")?;
            Ok(buf)
        }
        Some(raw) => {
            let path = normalize_input_path(raw);
            std::fs::read_to_string(&path)
                .with_context(|| format!("read code from {}", path.display()))
        }
    }
}

/// Loads and encodes an image file.
///
/// The MIME type comes from the file's magic bytes, falling back to its
/// extension. Anything that is not a supported image is rejected.
///
/// # Errors
/// Returns an error if the file cannot be read, is too large, or is not an image.
pub fn load_image(raw_path: &str) -> Result<ImageInput> {
    let path = normalize_input_path(raw_path);
    let metadata = std::fs::metadata(&path)
        .with_context(|| format!("read metadata for {}", path.display()))?;
    if metadata.len() > MAX_IMAGE_BYTES {
        bail!(
            "Image file '{}' is too large ({} bytes, maximum {MAX_IMAGE_BYTES})",
            path.display(),
            metadata.len()
        );
    }

    let bytes = std::fs::read(&path).with_context(|| format!("read image {}", path.display()))?;
    let Some(mime_type) = detect_image_mime(&bytes, &path) else {
        bail!(INVALID_IMAGE_MESSAGE);
    };

    tracing::debug!(path = %path.display(), mime_type, bytes = bytes.len(), "loaded image input");
    Ok(ImageInput {
        path,
        mime_type: mime_type.to_string(),
        data: BASE64.encode(&bytes),
    })
}

fn detect_image_mime(bytes: &[u8], path: &Path) -> Option<&'static str> {
    if let Some(kind) = infer::get(bytes) {
        let mime = kind.mime_type();
        return SUPPORTED_IMAGE_MIMES.iter().copied().find(|m| *m == mime);
    }
    path.to_str().and_then(mime_type_for_extension)
}

/// Normalizes user-provided file paths.
///
/// Handles shell escaping left over from drag-and-drop (`\ `, `\(`, `\)`)
/// and expands `~/` to the home directory.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(unescaped)
}

/// MIME type for supported image extensions.
#[must_use]
pub fn mime_type_for_extension(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
