use image::DynamicImage;
use tokio::sync::mpsc;

use crate::backend::api::{ApiClient, ApiError, CHAPTER_PAGE_SIZE, CatalogQuery};
use crate::backend::image_source::ImageSrc;
use crate::backend::models::{Chapter, Genre, Manga, Metadata, Page, Paginated, sort_pages};
use crate::ui::request::Ticket;

/// A fetch the UI wants run in the background.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    Catalog(Ticket, CatalogQuery),
    Cover(Ticket, i64, ImageSrc),
    Manga(Ticket, i64),
    Genres(Ticket, i64),
    Metadata(Ticket, i64),
    Chapters(Ticket, i64, u32),
    ChapterList(Ticket, i64),
    GenreListing(Ticket, String),
    Reader(Ticket, i64),
    PageImage(Ticket, ImageSrc),
}

pub enum BackgroundTask {
    Catalog(Ticket, Result<Paginated<Manga>, ApiError>),
    Cover(Ticket, i64, Option<DynamicImage>),
    Manga(Ticket, Result<Manga, ApiError>),
    Genres(Ticket, Result<Vec<Genre>, ApiError>),
    Metadata(Ticket, Result<Metadata, ApiError>),
    Chapters(Ticket, Result<Paginated<Chapter>, ApiError>),
    ChapterList(Ticket, Result<Vec<Chapter>, ApiError>),
    GenreListing(Ticket, Result<Vec<Manga>, ApiError>),
    Reader(Ticket, Result<(Chapter, Vec<Page>), ApiError>),
    PageImage(Ticket, Option<DynamicImage>),
}

impl BackgroundTask {
    pub fn ticket(&self) -> Ticket {
        match self {
            BackgroundTask::Catalog(t, _)
            | BackgroundTask::Cover(t, _, _)
            | BackgroundTask::Manga(t, _)
            | BackgroundTask::Genres(t, _)
            | BackgroundTask::Metadata(t, _)
            | BackgroundTask::Chapters(t, _)
            | BackgroundTask::ChapterList(t, _)
            | BackgroundTask::GenreListing(t, _)
            | BackgroundTask::Reader(t, _)
            | BackgroundTask::PageImage(t, _) => *t,
        }
    }
}

pub fn spawn(client: &ApiClient, fetch: Fetch, tx: mpsc::UnboundedSender<BackgroundTask>) {
    let client = client.clone();
    tokio::spawn(async move {
        let task = run(&client, fetch).await;
        let _ = tx.send(task);
    });
}

async fn run(client: &ApiClient, fetch: Fetch) -> BackgroundTask {
    match fetch {
        Fetch::Catalog(t, query) => BackgroundTask::Catalog(t, client.catalog(&query).await),
        Fetch::Cover(t, manga_id, src) => {
            BackgroundTask::Cover(t, manga_id, client.fetch_image(&src).await)
        }
        Fetch::Manga(t, id) => BackgroundTask::Manga(t, client.get_manga(id).await),
        Fetch::Genres(t, id) => BackgroundTask::Genres(t, client.get_genres(id).await),
        Fetch::Metadata(t, id) => BackgroundTask::Metadata(t, client.get_metadata(id).await),
        Fetch::Chapters(t, id, page) => BackgroundTask::Chapters(
            t,
            client.get_chapters(id, page, CHAPTER_PAGE_SIZE).await,
        ),
        Fetch::ChapterList(t, manga_id) => {
            BackgroundTask::ChapterList(t, client.get_all_chapters(manga_id).await)
        }
        Fetch::GenreListing(t, genre) => {
            BackgroundTask::GenreListing(t, client.search_by_genre(&genre).await)
        }
        Fetch::Reader(t, chapter_id) => {
            let (chapter, pages) = tokio::join!(
                client.get_chapter(chapter_id),
                client.get_all_pages(chapter_id)
            );
            let loaded = chapter.and_then(|chapter| {
                let mut pages = pages?;
                sort_pages(&mut pages);
                Ok((chapter, pages))
            });
            BackgroundTask::Reader(t, loaded)
        }
        Fetch::PageImage(t, src) => BackgroundTask::PageImage(t, client.fetch_image(&src).await),
    }
}
