use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use ratatui_image::{Resize, StatefulImage, protocol::StatefulProtocol};

use super::app::{App, CatalogView, DetailView, GenreListingView, ReaderView, View};
use super::browse::STATUS_FILTERS;
use super::pagination::{PageItem, next_enabled, prev_enabled, visible_pages};
use crate::backend::models::Manga;

const CARD_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 16;

pub fn ui(f: &mut Frame, app: &mut App) {
    match app.view {
        View::Catalog => draw_catalog(f, &mut app.catalog),
        View::MangaDetail => match app.detail.as_mut() {
            Some(detail) => draw_detail(f, detail),
            None => draw_loading(f, "Loading manga..."),
        },
        View::GenreListing => match app.listing.as_ref() {
            Some(listing) => draw_genre_listing(f, listing),
            None => draw_loading(f, "Loading genre..."),
        },
        View::Reader => match app.reader.as_mut() {
            Some(reader) => draw_reader(f, reader),
            None => draw_loading(f, "Loading chapter..."),
        },
        View::NotFound => draw_not_found(f, app.not_found.as_deref().unwrap_or("Not found")),
    }
}

fn spinner() -> &'static str {
    let spinner_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    spinner_frames[(millis / 100) as usize % spinner_frames.len()]
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn disabled_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn draw_loading(f: &mut Frame, message: &str) {
    let area = f.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Manga Reader")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);
    draw_centered_message(f, inner, message);
}

fn draw_centered_message(f: &mut Frame, area: Rect, message: &str) {
    let center_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(2),
            Constraint::Percentage(40),
        ])
        .split(area);

    let loading_text = Line::from(vec![
        Span::styled(
            format!(" {} ", spinner()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(message.to_string(), Style::default().fg(Color::White)),
    ]);
    f.render_widget(
        Paragraph::new(loading_text).alignment(Alignment::Center),
        center_layout[1],
    );
}

fn draw_notice(f: &mut Frame, area: Rect, message: &str) {
    let p = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(p, area);
}

// ----- catalog -----

fn draw_catalog(f: &mut Frame, catalog: &mut CatalogView) {
    let area = f.area();
    let notice_height = if catalog.error.is_some() { 3 } else { 0 };

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // search + sort/filter
            Constraint::Length(notice_height), // error notice
            Constraint::Min(CARD_HEIGHT),      // grid
            Constraint::Length(3),             // pagination
            Constraint::Length(3),             // footer
        ])
        .split(area);

    draw_catalog_header(f, root[0], catalog);
    if let Some(error) = &catalog.error {
        draw_notice(f, root[1], error);
    }
    draw_catalog_grid(f, root[2], catalog);

    let (current, total) = catalog
        .page
        .as_ref()
        .map(|p| (p.number, p.total_pages))
        .unwrap_or((0, 0));
    draw_pagination(f, root[3], current, total);

    let mut hints = vec![
        ("/", "search"),
        ("arrows", "select"),
        ("Enter", "open"),
        ("[ ]", "page"),
        ("s", "sort"),
        ("f", "status"),
    ];
    if catalog.history.len() > 1 {
        hints.push(("Backspace", "back"));
    }
    hints.push(("q", "quit"));
    draw_footer(f, root[4], &hints);
}

fn draw_catalog_header(f: &mut Frame, area: Rect, catalog: &CatalogView) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(44)])
        .split(area);

    let (border, cursor) = if catalog.editing {
        (
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            "_",
        )
    } else {
        (Style::default().fg(Color::Cyan), "")
    };
    let search = Paragraph::new(Line::from(vec![
        Span::raw(catalog.browse.search_draft.clone()),
        Span::styled(cursor, key_style()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search manga")
            .border_style(border),
    );
    f.render_widget(search, layout[0]);

    let options = Paragraph::new(Line::from(vec![
        Span::styled("Sort: ", disabled_style()),
        Span::styled(catalog.browse.sort_order.label(), Style::default().fg(Color::White)),
        Span::styled("  Status: ", disabled_style()),
        Span::styled(catalog.browse.status_label().to_string(), Style::default().fg(Color::White)),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(options, layout[1]);
}

fn draw_catalog_grid(f: &mut Frame, area: Rect, catalog: &mut CatalogView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Catalog {}", catalog.history.current()))
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = catalog
        .page
        .as_ref()
        .map(|p| catalog.browse.apply_filter(&p.content))
        .unwrap_or_default();

    if visible.is_empty() {
        if catalog.loading {
            draw_centered_message(f, inner, "Loading manga...");
        } else if catalog.page.is_some() {
            let empty = Paragraph::new("No manga found")
                .alignment(Alignment::Center)
                .style(disabled_style());
            f.render_widget(empty, inner);
        }
        return;
    }

    let columns = (inner.width / CARD_WIDTH).max(1) as usize;
    let rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    catalog.columns = columns;

    // Scroll whole rows so the selected card stays on screen.
    let selected_row = catalog.selected / columns;
    let first_row = selected_row.saturating_sub(rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..rows).map(|_| Constraint::Length(CARD_HEIGHT)))
        .split(inner);

    for (r, row_area) in row_areas.iter().enumerate() {
        let card_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..columns).map(|_| Constraint::Length(CARD_WIDTH)))
            .split(*row_area);

        for (c, card_area) in card_areas.iter().enumerate() {
            let idx = (first_row + r) * columns + c;
            let Some(manga) = visible.get(idx) else {
                return;
            };
            draw_manga_card(
                f,
                *card_area,
                manga,
                idx == catalog.selected,
                catalog.covers.get_mut(&manga.id),
            );
        }
    }
}

fn status_text(manga: &Manga) -> String {
    let status = manga.status.as_deref().unwrap_or("");
    STATUS_FILTERS
        .iter()
        .find(|(value, _)| *value == status)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| status.to_string())
}

fn draw_manga_card(
    f: &mut Frame,
    area: Rect,
    manga: &Manga,
    selected: bool,
    image_state: Option<&mut StatefulProtocol>,
) {
    let border_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 4 || inner.width < 5 {
        return;
    }

    let card_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // cover
            Constraint::Length(2), // title
            Constraint::Length(1), // status
            Constraint::Length(1), // chapters
        ])
        .split(inner);

    draw_cover(f, card_layout[0], image_state);

    let title = wrap_text(&manga.title, inner.width as usize, 2);
    let title_paragraph = Paragraph::new(title.join("\n")).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(title_paragraph, card_layout[1]);

    let status_line = Line::from(vec![
        Span::styled("● ", Style::default().fg(Color::Green)),
        Span::styled(status_text(manga), Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(status_line), card_layout[2]);

    let chapters = Paragraph::new(format!("{} chapters", manga.total_chapters))
        .style(disabled_style());
    f.render_widget(chapters, card_layout[3]);
}

fn draw_cover(f: &mut Frame, area: Rect, image_state: Option<&mut StatefulProtocol>) {
    if let Some(state) = image_state {
        let image_widget = StatefulImage::new().resize(Resize::Scale(None));
        f.render_stateful_widget(image_widget, area, state);
    } else {
        let image_content = vec![
            Line::from(""),
            Line::from(Span::styled("📚", Style::default().fg(Color::Magenta))),
            Line::from(Span::styled("No cover", disabled_style())),
        ];
        let image_paragraph = Paragraph::new(image_content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(disabled_style()),
            )
            .alignment(Alignment::Center);
        f.render_widget(image_paragraph, area);
    }
}

/// Previous/next plus a windowed run of page numbers. Pages are shown
/// one-based.
fn draw_pagination(f: &mut Frame, area: Rect, current: u32, total: u32) {
    let items = visible_pages(current, total);
    if items.is_empty() {
        return;
    }

    let enabled = |on: bool| if on { key_style() } else { disabled_style() };
    let mut spans = vec![Span::styled("◀ Prev ", enabled(prev_enabled(current)))];
    for item in items {
        spans.push(match item {
            PageItem::Page(n) if n == current => Span::styled(
                format!(" [{}] ", n + 1),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            PageItem::Page(n) => Span::raw(format!(" {} ", n + 1)),
            PageItem::Ellipsis => Span::styled(" … ", disabled_style()),
        });
    }
    spans.push(Span::styled(" Next ▶", enabled(next_enabled(current, total))));

    let p = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Page {} of {}", current.saturating_add(1), total))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(p, area);
}

// ----- detail -----

fn draw_detail(f: &mut Frame, detail: &mut DetailView) {
    let area = f.area();

    let Some(manga) = detail.manga.as_ref() else {
        match &detail.error {
            Some(error) => draw_notice(f, area, error),
            None => draw_loading(f, "Loading manga..."),
        }
        return;
    };

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45), // cover + info
            Constraint::Min(6),         // chapters
            Constraint::Length(3),      // footer
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CARD_WIDTH), Constraint::Min(20)])
        .split(root[0]);

    draw_cover(f, top[0], detail.cover.as_mut());

    let info_block = Block::default()
        .borders(Borders::ALL)
        .title(manga.title.clone())
        .border_style(Style::default().fg(Color::Cyan));
    let info_inner = info_block.inner(top[1]);
    f.render_widget(info_block, top[1]);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Status: ", disabled_style()),
            Span::styled(status_text(manga), Style::default().fg(Color::Green)),
            Span::styled("   Chapters: ", disabled_style()),
            Span::raw(manga.total_chapters.to_string()),
        ]),
        genre_line(detail),
    ];
    for entry in &detail.metadata {
        let mut keys: Vec<_> = entry.iter().collect();
        keys.sort();
        for (key, value) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", key), disabled_style()),
                Span::raw(value.clone()),
            ]));
        }
    }
    lines.push(Line::from(""));
    let width = info_inner.width as usize;
    let remaining = (info_inner.height as usize).saturating_sub(lines.len());
    for text in wrap_text(&manga.synopsis, width, remaining) {
        lines.push(Line::from(text));
    }
    f.render_widget(Paragraph::new(lines), info_inner);

    draw_chapter_list(f, root[1], detail);

    draw_footer(
        f,
        root[2],
        &[
            ("↑/↓", "chapter"),
            ("Enter", "read"),
            ("[ ]", "chapter page"),
            ("Tab", "genre"),
            ("g", "browse genre"),
            ("o", "open source"),
            ("Esc", "back"),
        ],
    );
}

fn genre_line(detail: &DetailView) -> Line<'static> {
    let mut spans = vec![Span::styled("Genres: ", disabled_style())];
    for (i, genre) in detail.genres.iter().enumerate() {
        let style = if i == detail.genre_cursor {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Magenta)
        };
        spans.push(Span::styled(genre.name.clone(), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn draw_chapter_list(f: &mut Frame, area: Rect, detail: &mut DetailView) {
    let (current, total) = detail
        .chapters
        .as_ref()
        .map(|p| (p.number, p.total_pages))
        .unwrap_or((0, 0));

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(if total > 1 { 3 } else { 0 })])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Chapters")
        .border_style(Style::default().fg(Color::White));

    if let Some(error) = &detail.error {
        draw_notice(f, layout[0], error);
    } else if detail.chapters_loading && detail.chapters.is_none() {
        let inner = block.inner(layout[0]);
        f.render_widget(block, layout[0]);
        draw_centered_message(f, inner, "Loading chapters...");
    } else {
        let items: Vec<ListItem> = detail
            .chapters
            .as_ref()
            .map(|p| p.content.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|c| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        c.chapter_number.clone(),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(format!("  {}", c.chapter_date), disabled_style()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, layout[0], &mut detail.chapter_list);
    }

    draw_pagination(f, layout[1], current, total);
}

// ----- genre listing -----

fn draw_genre_listing(f: &mut Frame, listing: &GenreListingView) {
    let area = f.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Genre: {}", listing.genre))
        .border_style(Style::default().fg(Color::Magenta));

    if let Some(error) = &listing.error {
        draw_notice(f, root[0], error);
    } else if listing.loading {
        let inner = block.inner(root[0]);
        f.render_widget(block, root[0]);
        draw_centered_message(f, inner, "Loading...");
    } else if listing.results.is_empty() {
        let p = Paragraph::new("No manga found")
            .alignment(Alignment::Center)
            .style(disabled_style())
            .block(block);
        f.render_widget(p, root[0]);
    } else {
        let width = root[0].width.saturating_sub(6) as usize;
        let lines: Vec<Line> = listing
            .results
            .iter()
            .enumerate()
            .map(|(i, manga)| {
                let title = truncate_text(&manga.title, width);
                if i == listing.selected {
                    Line::from(Span::styled(
                        format!("▶ {}", title),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(format!("  {}", title))
                }
            })
            .collect();
        let visible_rows = root[0].height.saturating_sub(2) as usize;
        let scroll = listing.selected.saturating_sub(visible_rows.saturating_sub(1));
        let p = Paragraph::new(lines).block(block).scroll((scroll as u16, 0));
        f.render_widget(p, root[0]);
    }

    draw_footer(f, root[1], &[("↑/↓", "select"), ("Enter", "open"), ("Esc", "back")]);
}

// ----- reader -----

/// Shrinks `area` around its center for zoom levels below 1. Larger zoom
/// levels crop the image instead, so the area is kept whole.
fn zoomed_area(area: Rect, zoom: f32) -> Rect {
    if zoom >= 1.0 {
        return area;
    }
    let width = (area.width as f32 * zoom).round() as u16;
    let height = (area.height as f32 * zoom).round() as u16;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_reader(f: &mut Frame, reader: &mut ReaderView) {
    let area = f.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // chapter title + zoom
            Constraint::Min(5),    // page
            Constraint::Length(3), // navigation
        ])
        .split(area);

    let title = reader
        .chapter
        .as_ref()
        .map(|c| c.chapter_number.clone())
        .unwrap_or_else(|| format!("Chapter {}", reader.chapter_id));
    let state = &reader.state;
    let style_for_disabled =
        |disabled: bool| if disabled { disabled_style() } else { key_style() };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("[-]", style_for_disabled(state.zoom_out_disabled())),
        Span::raw(format!(" {}% ", state.zoom_percent())),
        Span::styled("[+]", style_for_disabled(state.zoom_in_disabled())),
        Span::raw("  "),
        Span::styled("[0]", key_style()),
        Span::styled(" reset", disabled_style()),
    ]))
    .alignment(Alignment::Right)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, root[0]);

    let page_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let page_area = page_block.inner(root[1]);
    f.render_widget(page_block, root[1]);

    if let Some(error) = &reader.error {
        draw_notice(f, page_area, error);
    } else if reader.loading {
        draw_centered_message(f, page_area, "Loading chapter...");
    } else if let Some(image) = reader.image.as_mut() {
        let target = zoomed_area(page_area, reader.state.zoom_level());
        f.render_stateful_widget(StatefulImage::new().resize(Resize::Scale(None)), target, image);
    } else if reader.image_loading {
        draw_centered_message(f, page_area, "Loading page...");
    } else {
        let url = reader.current_page().map(|p| p.image_url.as_str()).unwrap_or("");
        let p = Paragraph::new(vec![
            Line::from(Span::styled("Page image unavailable", disabled_style())),
            Line::from(url.to_string()),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        f.render_widget(p, page_area);
    }

    let state = &reader.state;
    let total = state.total_pages();
    let position = if total == 0 {
        "0 / 0".to_string()
    } else {
        format!("{} / {}", state.current_index() + 1, total)
    };
    let nav = Paragraph::new(Line::from(vec![
        Span::styled("◀ Prev  ", style_for_disabled(state.prev_disabled())),
        Span::styled(
            position,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Next ▶", style_for_disabled(state.next_disabled())),
        Span::styled("    n/p: chapter  Esc: back", disabled_style()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(nav, root[2]);
}

// ----- not found -----

fn draw_not_found(f: &mut Frame, message: &str) {
    let area = f.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("404")
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let center_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Percentage(40),
        ])
        .split(inner);

    let p = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press Enter to return to the catalog", disabled_style())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(p, center_layout[1]);
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        format!(
            "{}...",
            text.chars()
                .take(max_len.saturating_sub(3))
                .collect::<String>()
        )
    }
}

fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return vec![];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            if lines.len() >= max_lines {
                if let Some(last) = lines.last_mut() {
                    let char_count = last.chars().count();
                    if char_count > 3 {
                        *last = last.chars().take(char_count - 3).collect::<String>() + "...";
                    }
                }
                return lines;
            }
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() && lines.len() < max_lines {
        lines.push(current_line);
    }

    lines
}

fn draw_footer(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(key.to_string(), key_style()));
        spans.push(Span::raw(format!(": {}  ", action)));
    }

    let p = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::api::ApiError;
    use crate::backend::models::Paginated;
    use crate::tasks::{BackgroundTask, Fetch};
    use crate::ui::app::{App, Effect};
    use ratatui::{Terminal, backend::TestBackend};
    use std::time::Duration;

    #[test]
    fn test_zoomed_area_shrinks_around_center() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(zoomed_area(area, 0.5), Rect::new(25, 10, 50, 20));
        assert_eq!(zoomed_area(area, 1.0), area);
        assert_eq!(zoomed_area(area, 2.5), area);
    }

    #[test]
    fn test_wrap_text_ellipsizes_overflow() {
        let lines = wrap_text("one two three four five", 9, 2);
        assert_eq!(lines, vec!["one two".to_string(), "th...".to_string()]);
        assert!(wrap_text("anything", 0, 3).is_empty());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Berserk", 10), "Berserk");
        assert_eq!(truncate_text("One Punch Man", 8), "One P...");
    }

    #[test]
    fn test_catalog_render_records_columns() {
        let mut app = App::new(None, Duration::ZERO, "");
        app.catalog.page = Some(Paginated {
            content: (1..=4)
                .map(|id| Manga {
                    id,
                    title: format!("Manga {id}"),
                    ..Default::default()
                })
                .collect(),
            total_pages: 3,
            ..Default::default()
        });

        let mut terminal = Terminal::new(TestBackend::new(92, 40)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();
        assert_eq!(app.catalog.columns, 3);

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Manga 1"));
        assert!(text.contains("Page 1 of 3"));
    }

    fn rendered_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(92, 40)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn catalog_ticket(effects: &[Effect]) -> crate::ui::request::Ticket {
        match &effects[0] {
            Effect::Fetch(Fetch::Catalog(t, _)) => *t,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_page_change_shows_page_on_screen() {
        let mut app = App::new(None, Duration::ZERO, "");
        let t = catalog_ticket(&app.load_catalog());
        app.apply(BackgroundTask::Catalog(
            t,
            Ok(Paginated {
                content: vec![Manga { id: 1, title: "Berserk".into(), ..Default::default() }],
                total_pages: 3,
                number: 0,
                ..Default::default()
            }),
        ));

        let t = catalog_ticket(&app.set_catalog_page(1));
        app.apply(BackgroundTask::Catalog(t, Err(ApiError::Status(500))));

        let text = rendered_text(&mut app);
        assert!(text.contains("Berserk"));
        assert!(text.contains("Page 1 of 3"));
        assert!(!text.contains("Page 2 of 3"));
    }
}
