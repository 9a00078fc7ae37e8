//! Slideshow state: the image list, the displayed position and the
//! play/pause flag.
//!
//! All mutation goes through [`Slideshow`] so a single task can own it. The
//! listing refresh compares whole sequences and only clamps the index when it
//! falls out of bounds; it does not follow an image across reorderings, so
//! the displayed picture can change on refresh.

use std::time::Duration;

pub const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(5);
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Minimum horizontal travel, in pixels, for a touch gesture to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Empty,
    Slides,
    LoadError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Rerendered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    TogglePlay,
    Quit,
}

impl Command {
    /// Keyboard bindings of the viewer.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(Command::Next),
            "ArrowLeft" => Some(Command::Previous),
            " " => Some(Command::TogglePlay),
            _ => None,
        }
    }

    /// Swiping left shows the next slide, swiping right the previous one.
    pub fn from_swipe(start_x: f32, end_x: f32) -> Option<Self> {
        let diff = start_x - end_x;
        if diff.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        if diff > 0.0 {
            Some(Command::Next)
        } else {
            Some(Command::Previous)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slideshow {
    images: Vec<String>,
    current_index: usize,
    playing: bool,
    view: View,
    renders: u64,
}

impl Slideshow {
    pub fn new(playing: bool) -> Self {
        Self {
            images: Vec::new(),
            current_index: 0,
            playing,
            view: View::Loading,
            renders: 0,
        }
    }

    /// First listing after start-up.
    pub fn load(&mut self, images: Vec<String>) {
        self.images = images;
        self.current_index = 0;
        self.render();
    }

    pub fn load_failed(&mut self) {
        self.view = View::LoadError;
    }

    /// Reconciles a polled listing with the displayed one.
    pub fn refresh(&mut self, images: Vec<String>) -> SyncOutcome {
        if self.view != View::LoadError && images == self.images {
            return SyncOutcome::Unchanged;
        }

        self.images = images;
        if self.current_index >= self.images.len() {
            self.current_index = 0;
        }
        self.render();
        SyncOutcome::Rerendered
    }

    fn render(&mut self) {
        self.view = if self.images.is_empty() {
            View::Empty
        } else {
            View::Slides
        };
        self.renders += 1;
    }

    pub fn next(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current_index = (self.current_index + 1) % self.images.len();
    }

    pub fn previous(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current_index = if self.current_index == 0 {
            self.images.len() - 1
        } else {
            self.current_index - 1
        };
    }

    /// Flips play/pause and returns the new state.
    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    /// Autoplay only runs while playing with more than one slide.
    pub fn autoplay_active(&self) -> bool {
        self.playing && self.images.len() > 1
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&str> {
        self.images.get(self.current_index).map(String::as_str)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// `(position, total)` as shown in the counter; `(0, 0)` when empty.
    pub fn counter(&self) -> (usize, usize) {
        if self.images.is_empty() {
            (0, 0)
        } else {
            (self.current_index + 1, self.images.len())
        }
    }
}
