use image::DynamicImage;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::image_source::{ImageSrc, decode_image};
use super::models::{Chapter, Genre, Manga, Metadata, Page, Paginated};

/// Header that makes the tunnelling gateway skip its browser interstitial.
pub const BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

pub const CATALOG_PAGE_SIZE: u32 = 15;
pub const CHAPTER_PAGE_SIZE: u32 = 20;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API URL not configured")]
    NotConfigured,

    #[error("API responded with {0}")]
    Status(u16),

    #[error("failed to connect to API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected API response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status(404))
    }
}

/// Where requests go: straight to the upstream API, or through a forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Direct(String),
    Proxy(String),
    Unconfigured,
}

impl Endpoint {
    pub fn url(&self, path: &str) -> Result<String, ApiError> {
        let path = path.trim_start_matches('/');
        match self {
            Endpoint::Direct(base) => Ok(format!("{}/api/{}", base.trim_end_matches('/'), path)),
            Endpoint::Proxy(base) => Ok(format!("{}/proxy/{}", base.trim_end_matches('/'), path)),
            Endpoint::Unconfigured => Err(ApiError::NotConfigured),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    IdDesc,
    IdAsc,
    TitleAsc,
    TitleDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::IdDesc,
        SortOrder::IdAsc,
        SortOrder::TitleAsc,
        SortOrder::TitleDesc,
    ];

    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::IdDesc => "id,desc",
            SortOrder::IdAsc => "id,asc",
            SortOrder::TitleAsc => "title,asc",
            SortOrder::TitleDesc => "title,desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::IdDesc => "Newest",
            SortOrder::IdAsc => "Oldest",
            SortOrder::TitleAsc => "A - Z",
            SortOrder::TitleDesc => "Z - A",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// The single catalog request a browse state maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    List { page: u32, size: u32, sort: SortOrder },
    Search { title: String, page: u32, size: u32 },
}

impl CatalogQuery {
    pub fn path(&self) -> String {
        match self {
            CatalogQuery::List { page, size, sort } => {
                format!("mangas?page={}&size={}&sort={}", page, size, sort.as_param())
            }
            CatalogQuery::Search { title, page, size } => format!(
                "mangas/search?title={}&page={}&size={}",
                urlencoding::encode(title),
                page,
                size
            ),
        }
    }
}

pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(BYPASS_HEADER, HeaderValue::from_static("true"));

    reqwest::Client::builder()
        .user_agent(concat!("mangaview/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
}

/// Image hosts are plain CDNs; they get neither the JSON accept header nor
/// the gateway bypass header.
fn build_image_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("mangaview/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Read-only client for the catalog API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    images: reqwest::Client,
    endpoint: Endpoint,
}

impl ApiClient {
    pub fn new(endpoint: Endpoint) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http_client()?,
            images: build_image_client()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint.url(path)?;
        log::debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("GET {} -> {}", url, status);
            return Err(ApiError::Status(status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode(e.to_string())
            } else {
                ApiError::Transport(e)
            }
        })
    }

    pub async fn catalog(&self, query: &CatalogQuery) -> Result<Paginated<Manga>, ApiError> {
        match query {
            CatalogQuery::List { page, size, sort } => self.get_mangas(*page, *size, *sort).await,
            CatalogQuery::Search { title, page, size } => {
                self.search_mangas(title, *page, *size).await
            }
        }
    }

    pub async fn get_mangas(
        &self,
        page: u32,
        size: u32,
        sort: SortOrder,
    ) -> Result<Paginated<Manga>, ApiError> {
        self.get_json(&CatalogQuery::List { page, size, sort }.path())
            .await
    }

    pub async fn search_mangas(
        &self,
        title: &str,
        page: u32,
        size: u32,
    ) -> Result<Paginated<Manga>, ApiError> {
        let query = CatalogQuery::Search {
            title: title.to_string(),
            page,
            size,
        };
        self.get_json(&query.path()).await
    }

    pub async fn get_manga(&self, id: i64) -> Result<Manga, ApiError> {
        self.get_json(&format!("mangas/{}", id)).await
    }

    pub async fn get_chapters(
        &self,
        manga_id: i64,
        page: u32,
        size: u32,
    ) -> Result<Paginated<Chapter>, ApiError> {
        self.get_json(&format!("chapters/manga/{}?page={}&size={}", manga_id, page, size))
            .await
    }

    pub async fn get_all_chapters(&self, manga_id: i64) -> Result<Vec<Chapter>, ApiError> {
        self.get_json(&format!("chapters/manga/{}/all", manga_id)).await
    }

    pub async fn get_chapter(&self, id: i64) -> Result<Chapter, ApiError> {
        self.get_json(&format!("chapters/{}", id)).await
    }

    #[cfg(test)]
    pub async fn get_pages(
        &self,
        chapter_id: i64,
        page: u32,
        size: u32,
    ) -> Result<Paginated<Page>, ApiError> {
        self.get_json(&format!("pages/chapter/{}?page={}&size={}", chapter_id, page, size))
            .await
    }

    pub async fn get_all_pages(&self, chapter_id: i64) -> Result<Vec<Page>, ApiError> {
        self.get_json(&format!("pages/chapter/{}/all", chapter_id)).await
    }

    pub async fn get_genres(&self, manga_id: i64) -> Result<Vec<Genre>, ApiError> {
        self.get_json(&format!("genres/manga/{}", manga_id)).await
    }

    pub async fn search_by_genre(&self, genre: &str) -> Result<Vec<Manga>, ApiError> {
        self.get_json(&format!("genres/search?genre={}", urlencoding::encode(genre)))
            .await
    }

    pub async fn get_metadata(&self, manga_id: i64) -> Result<Metadata, ApiError> {
        self.get_json(&format!("metadata/manga/{}", manga_id)).await
    }

    /// Turns a resolved image source into pixels. Nothing is cached.
    pub async fn fetch_image(&self, src: &ImageSrc) -> Option<DynamicImage> {
        match src {
            ImageSrc::Inline(bytes) => decode_image(bytes),
            ImageSrc::Remote(url) => {
                let response = self
                    .images
                    .get(url)
                    .header(ACCEPT, "image/*")
                    .send()
                    .await
                    .ok()?;
                if !response.status().is_success() {
                    log::warn!("Image {} -> {}", url, response.status());
                    return None;
                }
                let bytes = response.bytes().await.ok()?;
                decode_image(&bytes)
            }
            ImageSrc::Missing => None,
        }
    }
}
