//! Scripts injected into hosted pages and helpers for their results.

use url::Url;

use crate::types::tab::TabKind;

const DISABLE_AUTOCORRECT_JS: &str = include_str!("../../resources/scripts/disable_autocorrect.js");
const THEATER_MODE_JS: &str = include_str!("../../resources/scripts/theater_mode.js");

/// Evaluates to the playback offset of the first `<video>` in seconds, or null.
pub const POSITION_QUERY: &str =
    "(function(){var v=document.querySelector('video');return v?v.currentTime:null;})()";

/// Asks the page's player to go fullscreen, which the theater script turns
/// into the full-viewport layout.
pub const THEATER_ENTER: &str = "(function(){var p=document.querySelector('#movie_player');\
if(p&&typeof p.requestFullscreen==='function'){p.requestFullscreen();}})();";

pub const THEATER_EXIT: &str =
    "(function(){if(typeof document.exitFullscreen==='function'){document.exitFullscreen();}})();";

const VIDEO_WATCH_BASE: &str = "https://www.youtube.com/watch";
const RESUME_PARAM: &str = "t";

/// Scripts run at document start for every page load in `tab`.
pub fn initialization_scripts(tab: TabKind) -> Vec<&'static str> {
    let mut scripts = vec![DISABLE_AUTOCORRECT_JS];
    if tab == TabKind::Video {
        scripts.push(THEATER_MODE_JS);
    }
    scripts
}

/// True for absolute http(s) URLs.
pub fn is_loadable_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Parses the JSON result of [`POSITION_QUERY`] into whole seconds.
///
/// Anything that is not a finite offset of at least one second is treated as
/// "no position".
pub fn parse_position(raw: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let secs = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if secs.is_finite() && secs >= 1.0 {
        Some(secs.floor() as u64)
    } else {
        None
    }
}

/// Returns `url` with its `t` query parameter set to `secs` seconds.
///
/// Other query parameters keep their order. Returns `None` when `url` does not
/// parse.
pub fn compose_resume_url(url: &str, secs: u64) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != RESUME_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(RESUME_PARAM, &format!("{}s", secs));
    Some(parsed.to_string())
}

/// Turns toolbar input into a video URL.
///
/// Accepts a full http(s) URL or a bare video id such as `dQw4w9WgXcQ`.
pub fn normalize_video_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return is_loadable_url(trimmed).then(|| trimmed.to_string());
    }
    let is_id = trimmed.len() <= 64
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !is_id {
        return None;
    }
    let mut url = Url::parse(VIDEO_WATCH_BASE).ok()?;
    url.query_pairs_mut().append_pair("v", trimmed);
    Some(url.to_string())
}
