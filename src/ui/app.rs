use image::DynamicImage;
use ratatui::widgets::ListState;
use ratatui_image::{picker::Picker, protocol::StatefulProtocol};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::browse::{BrowseState, History};
use super::keys::{KeyBus, KeySubscription};
use super::reader::{ReaderCommand, ReaderState, crop_window};
use super::request::{RequestTracker, Slot};
use crate::backend::api::ApiError;
use crate::backend::image_source::ImageSrc;
use crate::backend::models::{Chapter, Genre, Manga, Metadata, Page, Paginated};
use crate::tasks::{BackgroundTask, Fetch};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum View {
    #[default]
    Catalog,
    MangaDetail,
    GenreListing,
    Reader,
    NotFound,
}

/// Something the event loop has to do on the app's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(Fetch),
    OpenLink(String),
    Quit,
}

pub struct CatalogView {
    pub browse: BrowseState,
    pub history: History,
    pub page: Option<Paginated<Manga>>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: usize,
    pub columns: usize,
    pub editing: bool,
    pub search_debounce: Option<Instant>,
    pub covers: HashMap<i64, StatefulProtocol>,
    /// Location of the content currently on screen.
    shown_location: String,
}

impl CatalogView {
    fn new(location: &str) -> Self {
        let browse = BrowseState::from_query(location);
        let shown_location = browse.location_query();
        let mut history = History::default();
        history.push(shown_location.clone());

        Self {
            browse,
            history,
            page: None,
            loading: false,
            error: None,
            selected: 0,
            columns: 1,
            editing: false,
            search_debounce: None,
            covers: HashMap::new(),
            shown_location,
        }
    }

    /// The fetched page after the client-side status filter.
    pub fn visible(&self) -> Vec<&Manga> {
        self.page
            .as_ref()
            .map(|p| self.browse.apply_filter(&p.content))
            .unwrap_or_default()
    }

    pub fn selected_manga(&self) -> Option<&Manga> {
        self.visible().get(self.selected).copied()
    }
}

pub struct DetailView {
    pub manga_id: i64,
    pub manga: Option<Manga>,
    pub genres: Vec<Genre>,
    pub genre_cursor: usize,
    pub metadata: Metadata,
    pub chapters: Option<Paginated<Chapter>>,
    pub chapter_page: u32,
    pub chapter_list: ListState,
    pub cover: Option<StatefulProtocol>,
    pub loading: bool,
    pub chapters_loading: bool,
    pub error: Option<String>,
}

impl DetailView {
    fn new(manga_id: i64) -> Self {
        Self {
            manga_id,
            manga: None,
            genres: Vec::new(),
            genre_cursor: 0,
            metadata: Vec::new(),
            chapters: None,
            chapter_page: 0,
            chapter_list: ListState::default(),
            cover: None,
            loading: true,
            chapters_loading: true,
            error: None,
        }
    }

    pub fn selected_chapter(&self) -> Option<&Chapter> {
        let idx = self.chapter_list.selected()?;
        self.chapters.as_ref()?.content.get(idx)
    }
}

pub struct GenreListingView {
    pub genre: String,
    pub results: Vec<Manga>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ReaderView {
    pub chapter_id: i64,
    pub manga_id: Option<i64>,
    pub chapter: Option<Chapter>,
    pub pages: Vec<Page>,
    pub state: ReaderState,
    pub image: Option<StatefulProtocol>,
    /// Decoded current page; the protocol above is rebuilt from it on zoom.
    page_image: Option<DynamicImage>,
    pub image_loading: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Every chapter of the manga, oldest first, for chapter jumps.
    pub siblings: Vec<Chapter>,
    keys: KeySubscription,
}

impl ReaderView {
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.state.current_index())
    }

    fn sibling(&self, offset: isize) -> Option<&Chapter> {
        let pos = self.siblings.iter().position(|c| c.id == self.chapter_id)?;
        let target = pos.checked_add_signed(offset)?;
        self.siblings.get(target)
    }
}

pub struct App {
    pub view: View,
    pub picker: Option<Picker>,
    pub keys: KeyBus,
    pub requests: RequestTracker,
    pub debounce: Duration,
    pub catalog: CatalogView,
    pub detail: Option<DetailView>,
    pub listing: Option<GenreListingView>,
    pub reader: Option<ReaderView>,
    pub not_found: Option<String>,
}

fn notice(what: &str, e: &ApiError) -> String {
    format!("Failed to load {}: {}", what, e)
}

impl App {
    pub fn new(picker: Option<Picker>, debounce: Duration, location: &str) -> Self {
        Self {
            view: View::Catalog,
            picker,
            keys: KeyBus::new(),
            requests: RequestTracker::new(),
            debounce,
            catalog: CatalogView::new(location),
            detail: None,
            listing: None,
            reader: None,
            not_found: None,
        }
    }

    fn protocol(&self, image: DynamicImage) -> Option<StatefulProtocol> {
        self.picker.as_ref().map(|p| p.new_resize_protocol(image))
    }

    // ----- catalog -----

    /// Fetches the catalog for the current browse state. The location enters
    /// the history only once the fetch succeeds.
    pub fn load_catalog(&mut self) -> Vec<Effect> {
        let ticket = self.requests.issue(Slot::Catalog);
        self.requests.invalidate(&[Slot::Cover]);
        self.catalog.loading = true;
        self.catalog.error = None;
        vec![Effect::Fetch(Fetch::Catalog(ticket, self.catalog.browse.query()))]
    }

    pub fn submit_search(&mut self) -> Vec<Effect> {
        self.catalog.search_debounce = None;
        self.catalog.browse.submit_search();
        log::info!("Searching for {:?}", self.catalog.browse.active_search);
        self.load_catalog()
    }

    pub fn edit_search(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.catalog.browse.search_draft);
        self.catalog.search_debounce = Some(Instant::now());
    }

    pub fn set_catalog_page(&mut self, page: u32) -> Vec<Effect> {
        let total = self.catalog.page.as_ref().map(|p| p.total_pages).unwrap_or(0);
        if page >= total || page == self.catalog.browse.current_page {
            return Vec::new();
        }
        self.catalog.browse.set_page(page);
        self.load_catalog()
    }

    pub fn cycle_sort(&mut self) -> Vec<Effect> {
        let next = self.catalog.browse.sort_order.next();
        self.catalog.browse.set_sort(next);
        self.load_catalog()
    }

    pub fn cycle_status_filter(&mut self) {
        self.catalog.browse.cycle_status_filter();
        self.catalog.selected = 0;
    }

    /// Steps back through catalog locations, re-deriving state from the
    /// location that becomes current.
    pub fn catalog_back(&mut self) -> Vec<Effect> {
        let Some(location) = self.catalog.history.back().map(str::to_string) else {
            return Vec::new();
        };
        self.catalog.browse.sync_from_query(&location);
        self.load_catalog()
    }

    /// Called on every loop iteration; submits a search once typing pauses.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let Some(started) = self.catalog.search_debounce else {
            return Vec::new();
        };
        if now.duration_since(started) < self.debounce {
            return Vec::new();
        }
        self.catalog.search_debounce = None;
        let browse = &self.catalog.browse;
        if browse.search_draft == browse.active_search {
            return Vec::new();
        }
        self.submit_search()
    }

    // ----- navigation between views -----

    pub fn open_manga(&mut self, manga_id: i64) -> Vec<Effect> {
        self.leave_reader();
        self.view = View::MangaDetail;
        self.detail = Some(DetailView::new(manga_id));
        self.requests.invalidate(&[Slot::DetailCover]);

        vec![
            Effect::Fetch(Fetch::Manga(self.requests.issue(Slot::Manga), manga_id)),
            Effect::Fetch(Fetch::Genres(self.requests.issue(Slot::Genres), manga_id)),
            Effect::Fetch(Fetch::Metadata(self.requests.issue(Slot::Metadata), manga_id)),
            Effect::Fetch(Fetch::Chapters(self.requests.issue(Slot::Chapters), manga_id, 0)),
        ]
    }

    pub fn set_chapter_page(&mut self, page: u32) -> Vec<Effect> {
        let Some(detail) = self.detail.as_mut() else {
            return Vec::new();
        };
        let total = detail.chapters.as_ref().map(|p| p.total_pages).unwrap_or(0);
        if page >= total || page == detail.chapter_page {
            return Vec::new();
        }
        detail.chapter_page = page;
        detail.chapters_loading = true;
        let ticket = self.requests.issue(Slot::Chapters);
        vec![Effect::Fetch(Fetch::Chapters(ticket, detail.manga_id, page))]
    }

    pub fn open_genre_listing(&mut self, genre: String) -> Vec<Effect> {
        self.view = View::GenreListing;
        let ticket = self.requests.issue(Slot::GenreListing);
        self.listing = Some(GenreListingView {
            genre: genre.clone(),
            results: Vec::new(),
            selected: 0,
            loading: true,
            error: None,
        });
        vec![Effect::Fetch(Fetch::GenreListing(ticket, genre))]
    }

    pub fn open_reader(&mut self, chapter_id: i64, manga_id: Option<i64>) -> Vec<Effect> {
        let siblings = self
            .reader
            .take()
            .map(|r| r.siblings)
            .unwrap_or_default();
        self.requests.invalidate(&[Slot::PageImage]);
        self.view = View::Reader;

        let mut effects = vec![Effect::Fetch(Fetch::Reader(
            self.requests.issue(Slot::Reader),
            chapter_id,
        ))];
        if siblings.is_empty() {
            if let Some(manga_id) = manga_id {
                let ticket = self.requests.issue(Slot::ChapterList);
                effects.push(Effect::Fetch(Fetch::ChapterList(ticket, manga_id)));
            }
        }

        // The previous subscription was released with the old view above.
        self.reader = Some(ReaderView {
            chapter_id,
            manga_id,
            chapter: None,
            pages: Vec::new(),
            state: ReaderState::new(0),
            image: None,
            page_image: None,
            image_loading: false,
            loading: true,
            error: None,
            siblings,
            keys: self.keys.subscribe(),
        });
        effects
    }

    /// Tears the reader down, releasing its key subscription and its interest
    /// in any fetch still in flight.
    fn leave_reader(&mut self) -> Option<ReaderView> {
        self.requests
            .invalidate(&[Slot::Reader, Slot::PageImage, Slot::ChapterList]);
        self.reader.take()
    }

    /// Esc from the reader: back to the manga it belongs to.
    pub fn close_reader(&mut self) -> Vec<Effect> {
        let manga_id = self
            .leave_reader()
            .and_then(|r| r.manga_id.or(r.chapter.map(|c| c.manga_id)));

        match manga_id {
            Some(id) if self.detail.as_ref().is_some_and(|d| d.manga_id == id) => {
                self.view = View::MangaDetail;
                Vec::new()
            }
            Some(id) => self.open_manga(id),
            None => self.back_to_catalog(),
        }
    }

    pub fn jump_chapter(&mut self, offset: isize) -> Vec<Effect> {
        let Some(reader) = &self.reader else {
            return Vec::new();
        };
        let Some(target) = reader.sibling(offset).map(|c| (c.id, c.manga_id)) else {
            return Vec::new();
        };
        log::info!("Jumping to chapter {}", target.0);
        self.open_reader(target.0, Some(target.1))
    }

    pub fn back_to_catalog(&mut self) -> Vec<Effect> {
        self.leave_reader();
        self.requests.invalidate(&[
            Slot::Manga,
            Slot::Genres,
            Slot::Metadata,
            Slot::Chapters,
            Slot::GenreListing,
            Slot::DetailCover,
        ]);
        self.detail = None;
        self.listing = None;
        self.not_found = None;
        self.view = View::Catalog;

        if self.catalog.page.is_none() && !self.catalog.loading {
            return self.load_catalog();
        }
        Vec::new()
    }

    fn show_not_found(&mut self, message: &str) {
        self.leave_reader();
        self.not_found = Some(message.to_string());
        self.view = View::NotFound;
    }

    // ----- reader -----

    /// Applies whatever keys reached the reader's subscription.
    pub fn pump_reader(&mut self) -> Vec<Effect> {
        let Some(reader) = self.reader.as_mut() else {
            return Vec::new();
        };

        let zoom = reader.state.zoom_level();
        let mut moved = false;
        for key in reader.keys.drain() {
            if let Some(command) = ReaderCommand::from_key(key) {
                moved |= reader.state.apply(command);
            }
        }

        if moved {
            return self.load_page_image();
        }
        if reader.state.zoom_level() != zoom {
            self.refresh_page_protocol();
        }
        Vec::new()
    }

    fn refresh_page_protocol(&mut self) {
        let Some(reader) = self.reader.as_mut() else {
            return;
        };
        reader.image = match (&self.picker, &reader.page_image) {
            (Some(picker), Some(image)) => {
                let (x, y, w, h) =
                    crop_window(image.width(), image.height(), reader.state.zoom_level());
                Some(picker.new_resize_protocol(image.crop_imm(x, y, w, h)))
            }
            _ => None,
        };
    }

    fn load_page_image(&mut self) -> Vec<Effect> {
        let Some(reader) = self.reader.as_mut() else {
            return Vec::new();
        };
        let Some(page) = reader.current_page() else {
            return Vec::new();
        };
        let src = ImageSrc::of(page);
        reader.image = None;
        reader.page_image = None;
        reader.image_loading = true;
        let ticket = self.requests.issue(Slot::PageImage);
        vec![Effect::Fetch(Fetch::PageImage(ticket, src))]
    }

    // ----- background results -----

    pub fn apply(&mut self, task: BackgroundTask) -> Vec<Effect> {
        if !self.requests.is_current(task.ticket()) {
            log::debug!("Discarding stale result for {:?}", task.ticket());
            return Vec::new();
        }

        match task {
            BackgroundTask::Catalog(_, result) => self.catalog_loaded(result),
            BackgroundTask::Cover(ticket, manga_id, image) => {
                let protocol = image.and_then(|i| self.protocol(i));
                if ticket.slot == Slot::DetailCover {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.cover = protocol;
                    }
                } else if let Some(protocol) = protocol {
                    self.catalog.covers.insert(manga_id, protocol);
                }
                Vec::new()
            }
            BackgroundTask::Manga(_, result) => self.manga_loaded(result),
            BackgroundTask::Genres(_, result) => {
                if let Some(detail) = self.detail.as_mut() {
                    match result {
                        Ok(genres) => detail.genres = genres,
                        Err(e) => log::warn!("{}", notice("genres", &e)),
                    }
                }
                Vec::new()
            }
            BackgroundTask::Metadata(_, result) => {
                if let Some(detail) = self.detail.as_mut() {
                    match result {
                        Ok(metadata) => detail.metadata = metadata,
                        Err(e) => log::debug!("{}", notice("metadata", &e)),
                    }
                }
                Vec::new()
            }
            BackgroundTask::Chapters(_, result) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.chapters_loading = false;
                    match result {
                        Ok(chapters) => {
                            let selected = (!chapters.content.is_empty()).then_some(0);
                            detail.chapter_page = chapters.number;
                            detail.chapters = Some(chapters);
                            detail.chapter_list.select(selected);
                        }
                        Err(e) => detail.error = Some(notice("chapters", &e)),
                    }
                }
                Vec::new()
            }
            BackgroundTask::ChapterList(_, result) => {
                if let Some(reader) = self.reader.as_mut() {
                    match result {
                        Ok(mut chapters) => {
                            chapters.sort_by_key(|c| c.id);
                            reader.siblings = chapters;
                        }
                        Err(e) => log::warn!("{}", notice("chapter list", &e)),
                    }
                }
                Vec::new()
            }
            BackgroundTask::GenreListing(_, result) => {
                if let Some(listing) = self.listing.as_mut() {
                    listing.loading = false;
                    match result {
                        Ok(results) => listing.results = results,
                        Err(e) => listing.error = Some(notice("genre", &e)),
                    }
                }
                Vec::new()
            }
            BackgroundTask::Reader(_, result) => self.chapter_loaded(result),
            BackgroundTask::PageImage(_, image) => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.image_loading = false;
                    reader.page_image = image;
                }
                self.refresh_page_protocol();
                Vec::new()
            }
        }
    }

    fn catalog_loaded(&mut self, result: Result<Paginated<Manga>, ApiError>) -> Vec<Effect> {
        self.catalog.loading = false;
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                log::error!("{}", notice("catalog", &e));
                self.catalog.error = Some(format!(
                    "{}. Check the connection to the API.",
                    notice("manga", &e)
                ));
                self.restore_shown_location();
                return Vec::new();
            }
        };

        let location = self.catalog.browse.location_query();
        self.catalog.history.push(location.clone());
        self.catalog.shown_location = location;

        log::info!(
            "Catalog page {} of {} ({} items)",
            page.number.saturating_add(1),
            page.total_pages,
            page.content.len()
        );
        self.catalog.covers.clear();
        self.catalog.selected = 0;

        let mut effects = Vec::new();
        if self.picker.is_some() {
            let ticket = self.requests.issue(Slot::Cover);
            for manga in &page.content {
                let src = ImageSrc::of(manga);
                if src != ImageSrc::Missing {
                    effects.push(Effect::Fetch(Fetch::Cover(ticket, manga.id, src)));
                }
            }
        }
        self.catalog.page = Some(page);
        effects
    }

    /// Puts page, search and history back on the content still on screen,
    /// keeping whatever is typed in the search box.
    fn restore_shown_location(&mut self) {
        let catalog = &mut self.catalog;
        let draft = std::mem::take(&mut catalog.browse.search_draft);
        catalog.browse.sync_from_query(&catalog.shown_location);
        catalog.browse.search_draft = draft;
        catalog.history.push(catalog.shown_location.clone());
    }

    fn manga_loaded(&mut self, result: Result<Manga, ApiError>) -> Vec<Effect> {
        let manga = match result {
            Ok(manga) => manga,
            Err(e) if e.is_not_found() => {
                self.show_not_found("Manga not found");
                return Vec::new();
            }
            Err(e) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.loading = false;
                    detail.error = Some(notice("manga", &e));
                }
                return Vec::new();
            }
        };

        let Some(detail) = self.detail.as_mut() else {
            return Vec::new();
        };
        detail.loading = false;
        let src = ImageSrc::of(&manga);
        detail.manga = Some(manga);

        if self.picker.is_some() && src != ImageSrc::Missing {
            let ticket = self.requests.issue(Slot::DetailCover);
            let id = detail.manga_id;
            return vec![Effect::Fetch(Fetch::Cover(ticket, id, src))];
        }
        Vec::new()
    }

    fn chapter_loaded(&mut self, result: Result<(Chapter, Vec<Page>), ApiError>) -> Vec<Effect> {
        let (chapter, pages) = match result {
            Ok((_, pages)) if pages.is_empty() => {
                self.show_not_found("Chapter not found");
                return Vec::new();
            }
            Ok(loaded) => loaded,
            Err(e) if e.is_not_found() => {
                self.show_not_found("Chapter not found");
                return Vec::new();
            }
            Err(e) => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.loading = false;
                    reader.error = Some(notice("chapter", &e));
                }
                return Vec::new();
            }
        };

        let Some(reader) = self.reader.as_mut() else {
            return Vec::new();
        };
        log::info!("Reading {} ({} pages)", chapter.chapter_number, pages.len());
        reader.loading = false;
        reader.manga_id = Some(chapter.manga_id);
        reader.state = ReaderState::new(pages.len());
        reader.chapter = Some(chapter);
        reader.pages = pages;
        self.load_page_image()
    }
}
