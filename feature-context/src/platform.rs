use std::collections::HashMap;

/// Host capabilities the client reaches for outside of flag handling.
/// Injected so tests can substitute a recording fake instead of patching globals.
pub trait Platform: Send + Sync {
    fn observe_intersection(&self, target: &str);
    fn unobserve_intersection(&self, target: &str);
    fn disconnect_intersection(&self);

    /// Whether the media query currently matches.
    fn match_media(&self, query: &str) -> bool;

    fn broadcast(&self, channel: &str, message: &str);
    fn close_channel(&self, channel: &str);

    fn open(&self, url: &str);
    fn scroll_to(&self, x: f64, y: f64);

    fn router_query(&self) -> HashMap<String, String>;
    fn router_push(&self, path: &str);
}

/// One recorded platform interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    ObserveIntersection(String),
    UnobserveIntersection(String),
    DisconnectIntersection,
    MatchMedia(String),
    Broadcast { channel: String, message: String },
    CloseChannel(String),
    Open(String),
    ScrollTo { x: f64, y: f64 },
    RouterPush(String),
}
