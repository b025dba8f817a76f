//! Back/forward bookkeeping for web engines that only report "page loaded".
//!
//! The surface records which direction it asked the engine to move; the next
//! finished load then moves the cursor instead of pushing a new entry.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Back,
    Forward,
    Reload,
}

#[derive(Debug, Default, Clone)]
pub struct NavHistory {
    entries: Vec<String>,
    index: usize,
    pending: Option<Pending>,
}

impl NavHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_back(&mut self) {
        if self.can_go_back() {
            self.pending = Some(Pending::Back);
        }
    }

    pub fn request_forward(&mut self) {
        if self.can_go_forward() {
            self.pending = Some(Pending::Forward);
        }
    }

    pub fn request_reload(&mut self) {
        self.pending = Some(Pending::Reload);
    }

    /// Records a finished page load of `url`.
    ///
    /// A pending move only applies when `url` is the entry it expects. Any
    /// other load clears it, since in-page navigations never report a load.
    pub fn page_loaded(&mut self, url: &str) {
        let expected = match self.pending.take() {
            Some(Pending::Back) => self.index.checked_sub(1),
            Some(Pending::Forward) => Some(self.index + 1),
            Some(Pending::Reload) => Some(self.index),
            None => None,
        };
        match expected {
            Some(i) if self.entries.get(i).map(String::as_str) == Some(url) => self.index = i,
            _ => {
                if self.current() == Some(url) {
                    return;
                }
                if !self.entries.is_empty() {
                    self.entries.truncate(self.index + 1);
                }
                self.entries.push(url.to_string());
                self.index = self.entries.len() - 1;
            }
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}
