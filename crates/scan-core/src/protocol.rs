//! Control messages exchanged with the stream endpoint.
//!
//! Text frames carry JSON control messages; binary frames carry one scan
//! line each (`width` bytes, one intensity byte per pixel). Parsing is
//! deliberately lenient: anything that does not look like a valid
//! announcement is ignored rather than reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row capacity used when an announcement omits `maxLines`.
pub const DEFAULT_MAX_LINES: u32 = 2048;

/// Status value that announces stream geometry.
pub const STATUS_RECORDING: &str = "recording";

/// Client to server control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Begin sending rows.
    Start,
    /// Stop sending rows.
    Stop,
}

/// Client to server control message: `{"action": "start"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCommand {
    /// Requested action.
    pub action: Action,
}

impl ClientCommand {
    /// Sent immediately after the connection opens.
    pub const START: Self = Self {
        action: Action::Start,
    };

    /// Sent before a client-initiated close.
    pub const STOP: Self = Self {
        action: Action::Stop,
    };

    /// Serialize to the JSON text frame payload.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a text frame received by the server side.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Dimensions of the ring surface announced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamGeometry {
    /// Bytes per row.
    pub width: u32,
    /// Row capacity of the ring surface.
    pub max_lines: u32,
}

impl StreamGeometry {
    /// Create a geometry from explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, max_lines: u32) -> Self {
        Self { width, max_lines }
    }

    /// Size in bytes of the full ring surface, `None` on overflow.
    #[must_use]
    pub fn surface_len(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.max_lines).ok()?)
    }
}

/// Server to client geometry announcement.
///
/// `{"status": "recording", "width": 512, "maxLines": 256}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAnnouncement {
    /// Always [`STATUS_RECORDING`] for geometry announcements.
    pub status: String,
    /// Bytes per row.
    pub width: u32,
    /// Row capacity the client should allocate.
    pub max_lines: u32,
}

impl StatusAnnouncement {
    /// Announcement for the given geometry.
    #[must_use]
    pub fn recording(geometry: StreamGeometry) -> Self {
        Self {
            status: STATUS_RECORDING.to_string(),
            width: geometry.width,
            max_lines: geometry.max_lines,
        }
    }

    /// Serialize to the JSON text frame payload.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Extract stream geometry from a control text frame.
///
/// Returns `None` when the frame is not JSON, is not a `"recording"` status,
/// or carries a `width` that is missing, non-numeric or below one pixel.
/// A missing or unusable `maxLines` falls back to `default_max_lines`.
/// Fractional values are truncated.
#[must_use]
pub fn parse_control(text: &str, default_max_lines: u32) -> Option<StreamGeometry> {
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("status").and_then(Value::as_str) != Some(STATUS_RECORDING) {
        return None;
    }

    let width = value
        .get("width")
        .and_then(Value::as_f64)
        .filter(|w| w.is_finite() && *w >= 1.0)?;

    let max_lines = value
        .get("maxLines")
        .and_then(Value::as_f64)
        .filter(|m| m.is_finite() && *m >= 1.0)
        .map_or(default_max_lines, |m| m.min(f64::from(u32::MAX)) as u32);

    Some(StreamGeometry {
        width: width.min(f64::from(u32::MAX)) as u32,
        max_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_commands_encode() {
        assert_eq!(ClientCommand::START.encode().unwrap(), r#"{"action":"start"}"#);
        assert_eq!(ClientCommand::STOP.encode().unwrap(), r#"{"action":"stop"}"#);
    }

    #[test]
    fn test_client_command_parse() {
        assert_eq!(ClientCommand::parse(r#"{"action":"stop"}"#), Some(ClientCommand::STOP));
        assert_eq!(ClientCommand::parse(r#"{"action":"rewind"}"#), None);
        assert_eq!(ClientCommand::parse("start"), None);
    }

    #[test]
    fn test_parse_full_announcement() {
        let g = parse_control(r#"{"status":"recording","width":512,"maxLines":256}"#, 2048);
        assert_eq!(g, Some(StreamGeometry::new(512, 256)));
    }

    #[test]
    fn test_parse_defaults_max_lines() {
        let g = parse_control(r#"{"status":"recording","width":640}"#, DEFAULT_MAX_LINES);
        assert_eq!(g, Some(StreamGeometry::new(640, 2048)));

        let g = parse_control(r#"{"status":"recording","width":640,"maxLines":"lots"}"#, 100);
        assert_eq!(g, Some(StreamGeometry::new(640, 100)));

        let g = parse_control(r#"{"status":"recording","width":640,"maxLines":null}"#, 100);
        assert_eq!(g, Some(StreamGeometry::new(640, 100)));
    }

    #[test]
    fn test_parse_rejects_bad_width() {
        for text in [
            r#"{"status":"recording"}"#,
            r#"{"status":"recording","width":0}"#,
            r#"{"status":"recording","width":-4}"#,
            r#"{"status":"recording","width":"512"}"#,
            r#"{"status":"recording","width":0.5}"#,
        ] {
            assert_eq!(parse_control(text, 2048), None, "accepted {text}");
        }
    }

    #[test]
    fn test_parse_ignores_other_frames() {
        assert_eq!(parse_control("Received: start", 2048), None);
        assert_eq!(parse_control(r#"{"status":"idle","width":512}"#, 2048), None);
        assert_eq!(parse_control("[1,2,3]", 2048), None);
        assert_eq!(parse_control("", 2048), None);
    }

    #[test]
    fn test_surface_len_checks_overflow() {
        assert_eq!(StreamGeometry::new(512, 256).surface_len(), Some(512 * 256));
        let max = u64::from(u32::MAX);
        assert_eq!(
            StreamGeometry::new(u32::MAX, u32::MAX).surface_len(),
            usize::try_from(max * max).ok()
        );
    }

    #[test]
    fn test_parse_truncates_fractional_width() {
        let g = parse_control(r#"{"status":"recording","width":512.9,"maxLines":10.2}"#, 2048);
        assert_eq!(g, Some(StreamGeometry::new(512, 10)));
    }

    #[test]
    fn test_announcement_roundtrips_through_parser() {
        let text = StatusAnnouncement::recording(StreamGeometry::new(1024, 300))
            .encode()
            .unwrap();
        assert!(text.contains(r#""maxLines":300"#));
        assert_eq!(parse_control(&text, 2048), Some(StreamGeometry::new(1024, 300)));
    }
}
