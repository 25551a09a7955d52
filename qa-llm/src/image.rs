//! Multimodal payload assembly: inline images attached to a generation
//! request, subject to a per-image size cap (spec.md §4.6).

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub path: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageAttachment {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Drops attachments over the cap rather than failing the whole call —
/// an oversized image degrades the payload, it doesn't abort the query.
pub fn enforce_size_cap(images: Vec<ImageAttachment>, max_bytes: usize) -> Vec<ImageAttachment> {
    images
        .into_iter()
        .filter(|img| {
            if img.bytes.len() > max_bytes {
                tracing::warn!(
                    path = %img.path,
                    size = img.bytes.len(),
                    cap = max_bytes,
                    "dropping oversized image attachment"
                );
                false
            } else {
                true
            }
        })
        .collect()
}

pub fn base64_encode(images: &[ImageAttachment]) -> Result<Vec<(String, String)>, LlmError> {
    use base64::Engine as _;
    Ok(images
        .iter()
        .map(|img| {
            (
                img.path.clone(),
                base64::engine::general_purpose::STANDARD.encode(&img.bytes),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_images_are_dropped() {
        let images = vec![
            ImageAttachment::new("a.png", vec![0u8; 10], "image/png"),
            ImageAttachment::new("b.png", vec![0u8; 100], "image/png"),
        ];
        let kept = enforce_size_cap(images, 50);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].path, "a.png");
    }
}
