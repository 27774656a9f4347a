use base64::{Engine as _, engine::general_purpose};
use image::DynamicImage;
use std::io::Cursor;

use super::models::{Manga, Page};

const INLINE_JPEG_PREFIX: &str = "data:image/jpeg;base64,";

/// Entities that carry an image in one of two encodings: inline data or a
/// remote URL. Inline data wins whenever it holds anything besides whitespace.
pub trait HasImageSource {
    fn inline_data(&self) -> Option<&str>;
    fn remote_url(&self) -> &str;

    fn image_src(&self) -> String {
        resolve(self.inline_data(), self.remote_url())
    }
}

impl HasImageSource for Manga {
    fn inline_data(&self) -> Option<&str> {
        self.image_base64.as_deref()
    }

    fn remote_url(&self) -> &str {
        &self.image_url
    }
}

impl HasImageSource for Page {
    fn inline_data(&self) -> Option<&str> {
        self.image_data.as_deref()
    }

    fn remote_url(&self) -> &str {
        &self.image_url
    }
}

/// Picks the string to use as an image source. An empty result means there is
/// no image to show.
pub fn resolve(inline: Option<&str>, remote: &str) -> String {
    match inline {
        Some(data) if !data.trim().is_empty() => {
            if data.starts_with("data:") {
                data.to_string()
            } else {
                format!("{INLINE_JPEG_PREFIX}{data}")
            }
        }
        _ => remote.to_string(),
    }
}

/// A resolved source, classified by how the terminal gets at its pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSrc {
    Inline(Vec<u8>),
    Remote(String),
    Missing,
}

impl ImageSrc {
    pub fn classify(src: &str) -> Self {
        if src.is_empty() {
            return ImageSrc::Missing;
        }
        if let Some(rest) = src.strip_prefix("data:") {
            return match decode_data_uri(rest) {
                Some(bytes) => ImageSrc::Inline(bytes),
                None => {
                    log::warn!("Undecodable inline image ({} bytes)", src.len());
                    ImageSrc::Missing
                }
            };
        }
        ImageSrc::Remote(src.to_string())
    }

    pub fn of(entity: &impl HasImageSource) -> Self {
        Self::classify(&entity.image_src())
    }
}

// `rest` is everything after "data:", i.e. "<mime>;base64,<payload>".
fn decode_data_uri(rest: &str) -> Option<Vec<u8>> {
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD.decode(payload).ok()
}

pub fn decode_image(bytes: &[u8]) -> Option<DynamicImage> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_base64_gets_jpeg_prefix() {
        assert_eq!(
            resolve(Some("/9j/4AAQ"), "https://cdn/x.jpg"),
            "data:image/jpeg;base64,/9j/4AAQ"
        );
    }

    #[test]
    fn test_data_uri_is_kept_verbatim() {
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(resolve(Some(uri), "https://cdn/x.jpg"), uri);
    }

    #[test]
    fn test_blank_inline_falls_back_to_url() {
        assert_eq!(resolve(Some("   \n"), "https://cdn/x.jpg"), "https://cdn/x.jpg");
        assert_eq!(resolve(Some(""), "https://cdn/x.jpg"), "https://cdn/x.jpg");
        assert_eq!(resolve(None, "https://cdn/x.jpg"), "https://cdn/x.jpg");
        assert_eq!(resolve(None, ""), "");
    }

    #[test]
    fn test_cover_and_page_share_priority() {
        let manga = Manga {
            image_base64: Some("abc".into()),
            image_url: "https://cdn/cover.jpg".into(),
            ..Default::default()
        };
        let page = Page {
            image_data: Some("abc".into()),
            image_url: "https://cdn/page.jpg".into(),
            ..Default::default()
        };
        assert_eq!(manga.image_src(), page.image_src());

        let page = Page {
            image_data: None,
            image_url: "https://cdn/page.jpg".into(),
            ..Default::default()
        };
        assert_eq!(page.image_src(), "https://cdn/page.jpg");
    }

    #[test]
    fn test_classify() {
        assert_eq!(ImageSrc::classify(""), ImageSrc::Missing);
        assert_eq!(
            ImageSrc::classify("https://cdn/x.jpg"),
            ImageSrc::Remote("https://cdn/x.jpg".into())
        );
        assert_eq!(
            ImageSrc::classify("data:image/jpeg;base64,aGVsbG8="),
            ImageSrc::Inline(b"hello".to_vec())
        );
        assert_eq!(ImageSrc::classify("data:text/plain,hello"), ImageSrc::Missing);
        assert_eq!(ImageSrc::classify("data:image/jpeg;base64,!!!"), ImageSrc::Missing);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(b"not an image").is_none());
    }
}
