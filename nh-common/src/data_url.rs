//! Data-URL helpers
//!
//! Images travel between client and relay as `data:image/<subtype>;base64,<payload>`.

/// Prefix every image data URL must start with
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// MIME type of everything the client uploads
pub const JPEG_MIME: &str = "image/jpeg";

/// True when `value` looks like an image data URL
///
/// Only the prefix is checked; the payload is forwarded untouched.
pub fn is_image_data_url(value: &str) -> bool {
    value.starts_with(IMAGE_DATA_URL_PREFIX)
}

/// Build a base64 data URL for the given MIME type
pub fn to_data_url(mime_type: &str, base64_payload: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_payload)
}

/// Split a base64 data URL into `(mime_type, payload)`
pub fn split_data_url(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}
