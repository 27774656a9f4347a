use crossterm::event::KeyCode;

/// Zoom is kept in quarter steps so repeated in/out never drifts.
const ZOOM_STEP_DIVISOR: f32 = 4.0;
const MIN_ZOOM_STEPS: u8 = 2; // 0.5x
const MAX_ZOOM_STEPS: u8 = 12; // 3.0x
const DEFAULT_ZOOM_STEPS: u8 = 4; // 1.0x

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand {
    PrevPage,
    NextPage,
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

impl ReaderCommand {
    /// Enter stands for activating the page on screen, which turns it.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Left => Some(ReaderCommand::PrevPage),
            KeyCode::Right | KeyCode::Enter => Some(ReaderCommand::NextPage),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(ReaderCommand::ZoomIn),
            KeyCode::Char('-') => Some(ReaderCommand::ZoomOut),
            KeyCode::Char('0') => Some(ReaderCommand::ResetZoom),
            _ => None,
        }
    }
}

/// The centered `(x, y, width, height)` window of a `width` x `height` image
/// that remains on screen at `zoom`. Zooming out never crops.
pub fn crop_window(width: u32, height: u32, zoom: f32) -> (u32, u32, u32, u32) {
    if zoom <= 1.0 {
        return (0, 0, width, height);
    }
    let w = ((width as f32 / zoom).round() as u32).max(1).min(width);
    let h = ((height as f32 / zoom).round() as u32).max(1).min(height);
    ((width - w) / 2, (height - h) / 2, w, h)
}

/// Position and zoom inside one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    current_index: usize,
    total_pages: usize,
    zoom_steps: u8,
}

impl ReaderState {
    pub fn new(total_pages: usize) -> Self {
        Self {
            current_index: 0,
            total_pages,
            zoom_steps: DEFAULT_ZOOM_STEPS,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_steps as f32 / ZOOM_STEP_DIVISOR
    }

    /// Zoom as a whole percentage, for display.
    pub fn zoom_percent(&self) -> u32 {
        self.zoom_steps as u32 * 25
    }

    /// Applies a command and reports whether the page index moved.
    pub fn apply(&mut self, command: ReaderCommand) -> bool {
        match command {
            ReaderCommand::PrevPage => return self.go_to_prev(),
            ReaderCommand::NextPage => return self.go_to_next(),
            ReaderCommand::ZoomIn => self.zoom_in(),
            ReaderCommand::ZoomOut => self.zoom_out(),
            ReaderCommand::ResetZoom => self.reset_zoom(),
        }
        false
    }

    pub fn go_to_prev(&mut self) -> bool {
        self.set_index(self.current_index.saturating_sub(1))
    }

    pub fn go_to_next(&mut self) -> bool {
        let last = self.total_pages.saturating_sub(1);
        self.set_index((self.current_index + 1).min(last))
    }

    // A new page always starts unzoomed.
    fn set_index(&mut self, index: usize) -> bool {
        if index == self.current_index {
            return false;
        }
        self.current_index = index;
        self.reset_zoom();
        true
    }

    pub fn zoom_in(&mut self) {
        self.zoom_steps = (self.zoom_steps + 1).min(MAX_ZOOM_STEPS);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_steps = self.zoom_steps.saturating_sub(1).max(MIN_ZOOM_STEPS);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_steps = DEFAULT_ZOOM_STEPS;
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_index == 0
    }

    pub fn next_disabled(&self) -> bool {
        self.current_index + 1 >= self.total_pages
    }

    pub fn zoom_out_disabled(&self) -> bool {
        self.zoom_steps <= MIN_ZOOM_STEPS
    }

    pub fn zoom_in_disabled(&self) -> bool {
        self.zoom_steps >= MAX_ZOOM_STEPS
    }
}
