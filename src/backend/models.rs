use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manga {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub synopsis: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    pub image_base64: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub manga_link: String,
    pub status: Option<String>,
    pub total_chapters: u32,
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Genre {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Chapter {
    pub id: i64,
    pub manga_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub chapter_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub chapter_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub chapter_date: String,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub id: i64,
    pub chapter_id: i64,
    pub page_number: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    pub image_data: Option<String>,
}

/// One page of a server-side paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    /// Zero-based index of this page.
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size: 0,
            number: 0,
            first: true,
            last: true,
            empty: true,
        }
    }
}

/// Upstream serializes absent strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub type Metadata = Vec<HashMap<String, String>>;

/// Sorts reader pages by their sequence number; upstream order is not guaranteed.
pub fn sort_pages(pages: &mut [Page]) {
    pages.sort_by_key(|p| p.page_number);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manga_decodes_with_missing_fields() {
        let json = r#"{"id": 7, "title": "Berserk", "imageUrl": "https://x/c.jpg", "totalChapters": 3}"#;
        let manga: Manga = serde_json::from_str(json).unwrap();
        assert_eq!(manga.id, 7);
        assert_eq!(manga.title, "Berserk");
        assert_eq!(manga.image_base64, None);
        assert_eq!(manga.status, None);
        assert!(manga.genres.is_empty());
        assert_eq!(manga.total_chapters, 3);
    }

    #[test]
    fn test_null_strings_become_empty() {
        let json = r#"{"id": 1, "title": "X", "synopsis": null, "mangaLink": null, "imageUrl": null}"#;
        let manga: Manga = serde_json::from_str(json).unwrap();
        assert_eq!(manga.synopsis, "");
        assert_eq!(manga.manga_link, "");
        assert_eq!(manga.image_url, "");
    }

    #[test]
    fn test_paginated_decodes_spring_page() {
        let json = r#"{
            "content": [{"id": 1, "mangaId": 2, "chapterNumber": "Capitulo 1", "chapterDate": "2024-01-01", "totalPages": 20}],
            "totalPages": 4, "totalElements": 61, "size": 20, "number": 0,
            "first": true, "last": false, "empty": false
        }"#;
        let page: Paginated<Chapter> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].chapter_number, "Capitulo 1");
        assert_eq!(page.total_elements, 61);
        assert!(page.first);
        assert!(!page.last);
    }

    #[test]
    fn test_sort_pages_orders_by_page_number() {
        let mut pages = vec![
            Page { id: 3, page_number: 3, ..Default::default() },
            Page { id: 1, page_number: 1, ..Default::default() },
            Page { id: 2, page_number: 2, ..Default::default() },
        ];
        sort_pages(&mut pages);
        let ids: Vec<i64> = pages.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
