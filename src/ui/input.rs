use crossterm::event::KeyCode;

use super::app::{App, Effect, View};

pub fn handle_key(app: &mut App, key: KeyCode) -> Vec<Effect> {
    if key == KeyCode::Char('q') && !app.catalog.editing {
        return vec![Effect::Quit];
    }

    match app.view {
        View::Catalog => handle_catalog_input(app, key),
        View::MangaDetail => handle_detail_input(app, key),
        View::GenreListing => handle_listing_input(app, key),
        View::Reader => handle_reader_input(app, key),
        View::NotFound => match key {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace => app.back_to_catalog(),
            _ => Vec::new(),
        },
    }
}

fn handle_catalog_input(app: &mut App, key: KeyCode) -> Vec<Effect> {
    if app.catalog.editing {
        return handle_search_input(app, key);
    }

    let count = app.catalog.visible().len();
    let columns = app.catalog.columns.max(1);
    let current_page = app.catalog.browse.current_page;
    let total_pages = app.catalog.page.as_ref().map(|p| p.total_pages).unwrap_or(0);

    match key {
        KeyCode::Char('/') => {
            app.catalog.editing = true;
            Vec::new()
        }
        KeyCode::Left => {
            app.catalog.selected = app.catalog.selected.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Right => {
            if app.catalog.selected + 1 < count {
                app.catalog.selected += 1;
            }
            Vec::new()
        }
        KeyCode::Up => {
            app.catalog.selected = app.catalog.selected.saturating_sub(columns);
            Vec::new()
        }
        KeyCode::Down => {
            if app.catalog.selected + columns < count {
                app.catalog.selected += columns;
            }
            Vec::new()
        }
        KeyCode::Enter => match app.catalog.selected_manga().map(|m| m.id) {
            Some(id) => app.open_manga(id),
            None => Vec::new(),
        },
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('f') => {
            app.cycle_status_filter();
            Vec::new()
        }
        KeyCode::Char('[') | KeyCode::PageUp if current_page > 0 => {
            app.set_catalog_page(current_page - 1)
        }
        KeyCode::Char(']') | KeyCode::PageDown => {
            app.set_catalog_page(current_page.saturating_add(1))
        }
        KeyCode::Home => app.set_catalog_page(0),
        KeyCode::End if total_pages > 0 => app.set_catalog_page(total_pages - 1),
        KeyCode::Backspace => app.catalog_back(),
        KeyCode::Char('r') => app.load_catalog(),
        _ => Vec::new(),
    }
}

fn handle_search_input(app: &mut App, key: KeyCode) -> Vec<Effect> {
    match key {
        KeyCode::Char(c) => {
            app.edit_search(|s| s.push(c));
            Vec::new()
        }
        KeyCode::Backspace => {
            app.edit_search(|s| {
                s.pop();
            });
            Vec::new()
        }
        KeyCode::Enter => {
            app.catalog.editing = false;
            app.submit_search()
        }
        KeyCode::Esc => {
            app.catalog.editing = false;
            app.catalog.search_debounce = None;
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn handle_detail_input(app: &mut App, key: KeyCode) -> Vec<Effect> {
    let Some(detail) = app.detail.as_mut() else {
        return app.back_to_catalog();
    };
    let chapter_count = detail.chapters.as_ref().map(|c| c.content.len()).unwrap_or(0);

    match key {
        KeyCode::Esc | KeyCode::Backspace => app.back_to_catalog(),
        KeyCode::Up => {
            let selected = detail.chapter_list.selected().unwrap_or(0);
            if selected > 0 {
                detail.chapter_list.select(Some(selected - 1));
            }
            Vec::new()
        }
        KeyCode::Down => {
            let selected = detail.chapter_list.selected().unwrap_or(0);
            if selected + 1 < chapter_count {
                detail.chapter_list.select(Some(selected + 1));
            }
            Vec::new()
        }
        KeyCode::Enter => {
            let manga_id = detail.manga_id;
            match detail.selected_chapter().map(|c| c.id) {
                Some(chapter_id) => app.open_reader(chapter_id, Some(manga_id)),
                None => Vec::new(),
            }
        }
        KeyCode::Char('[') | KeyCode::PageUp => {
            let page = detail.chapter_page;
            if page > 0 { app.set_chapter_page(page - 1) } else { Vec::new() }
        }
        KeyCode::Char(']') | KeyCode::PageDown => {
            let page = detail.chapter_page;
            app.set_chapter_page(page.saturating_add(1))
        }
        KeyCode::Tab => {
            if !detail.genres.is_empty() {
                detail.genre_cursor = (detail.genre_cursor + 1) % detail.genres.len();
            }
            Vec::new()
        }
        KeyCode::Char('g') => match detail.genres.get(detail.genre_cursor) {
            Some(genre) => {
                let name = genre.name.clone();
                app.open_genre_listing(name)
            }
            None => Vec::new(),
        },
        KeyCode::Char('o') => match detail.manga.as_ref().map(|m| m.manga_link.clone()) {
            Some(link) if !link.is_empty() => vec![Effect::OpenLink(link)],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_listing_input(app: &mut App, key: KeyCode) -> Vec<Effect> {
    let Some(listing) = app.listing.as_mut() else {
        return app.back_to_catalog();
    };

    match key {
        KeyCode::Esc | KeyCode::Backspace => {
            app.listing = None;
            if app.detail.is_some() {
                app.view = View::MangaDetail;
                Vec::new()
            } else {
                app.back_to_catalog()
            }
        }
        KeyCode::Up | KeyCode::Left => {
            listing.selected = listing.selected.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Down | KeyCode::Right => {
            if listing.selected + 1 < listing.results.len() {
                listing.selected += 1;
            }
            Vec::new()
        }
        KeyCode::Enter => match listing.results.get(listing.selected).map(|m| m.id) {
            Some(id) => app.open_manga(id),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_reader_input(app: &mut App, key: KeyCode) -> Vec<Effect> {
    match key {
        KeyCode::Esc => app.close_reader(),
        KeyCode::Char('n') => app.jump_chapter(1),
        KeyCode::Char('p') => app.jump_chapter(-1),
        _ => {
            app.keys.dispatch(key);
            app.pump_reader()
        }
    }
}
