use serde::{Deserialize, Serialize};

/// One of the three hosted destinations.
///
/// The set is closed: tabs are never created or destroyed by the user, only
/// their web surfaces are. Used as the key for sessions, access records and
/// persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    Chat,
    Video,
    Translate,
}

impl TabKind {
    /// All tabs in tab-bar order.
    pub const ALL: [TabKind; 3] = [TabKind::Chat, TabKind::Video, TabKind::Translate];

    pub fn title(self) -> &'static str {
        match self {
            TabKind::Chat => "ChatGPT",
            TabKind::Video => "YouTube",
            TabKind::Translate => "Translator",
        }
    }

    /// Glyph shown on the tab button.
    pub fn icon(self) -> &'static str {
        match self {
            TabKind::Chat => "\u{1F4AC}",
            TabKind::Video => "\u{25B6}",
            TabKind::Translate => "\u{6587}A",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            TabKind::Chat => "https://chat.openai.com",
            TabKind::Video => "https://www.youtube.com",
            TabKind::Translate => "https://translate.google.com",
        }
    }

    /// Key under which the last URL of this tab is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            TabKind::Chat => "chat_last_url",
            TabKind::Video => "video_last_url",
            TabKind::Translate => "translate_last_url",
        }
    }

    /// Whether the hosted page exposes a playback offset worth capturing.
    pub fn supports_resume(self) -> bool {
        matches!(self, TabKind::Video)
    }

    /// Whether the persisted URL is used when the tab is materialized again.
    /// Other tabs reopen at their default URL unless configured otherwise.
    pub fn restores_last_url(self) -> bool {
        matches!(self, TabKind::Video)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TabKind::Chat => "chat",
            TabKind::Video => "video",
            TabKind::Translate => "translate",
        }
    }

    pub fn from_name(name: &str) -> Option<TabKind> {
        TabKind::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for TabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tab as shown in the tab bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabEntry {
    pub kind: TabKind,
    pub title: String,
    pub icon: String,
    /// A live web surface exists for this tab.
    pub loaded: bool,
    pub selected: bool,
}

/// Tab bar state pushed to the toolbar after every handled event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellSnapshot {
    pub selected: TabKind,
    pub tabs: Vec<TabEntry>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub fullscreen: bool,
}
