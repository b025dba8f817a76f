//! ChatGate UI layer.
//!
//! Uses `wry` for the embedded web views:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! The toolbar is an HTML page in its own web view; each tab's site lives in a
//! child web view positioned below it.

pub mod webview_app;
