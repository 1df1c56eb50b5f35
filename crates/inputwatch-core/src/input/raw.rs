//! Raw input events as delivered by a platform adapter.
//!
//! # JSON representation
//!
//! Every event is a JSON object with a `"type"` field naming the event kind,
//! using the same lowercase names a browser uses for DOM events:
//!
//! ```json
//! {"type":"keydown","key":"Shift"}
//! {"type":"mousemove","x":100,"y":200}
//! {"type":"mousedown","button":"left"}
//! ```
//!
//! Kinds this crate does not know about (for example `"keypress"` or
//! `"touchstart"`) deserialize to [`RawInputEvent::Unrecognized`] instead of
//! failing, and every service ignores them.

use serde::{Deserialize, Serialize};

/// A single raw keyboard or mouse event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawInputEvent {
    /// A key transitioned down, or the OS auto-repeated a held key.
    KeyDown {
        /// Key identifier, case- and representation-sensitive.
        key: String,
    },
    /// A key was released.
    KeyUp { key: String },
    /// The pointer moved to an absolute position.
    MouseMove { x: i32, y: i32 },
    /// A pointer button was pressed.
    MouseDown { button: MouseButton },
    /// A pointer button was released.
    MouseUp { button: MouseButton },
    /// The wheel was scrolled; positive `delta_y` scrolls down.
    Wheel { delta_x: i32, delta_y: i32 },
    /// Any event kind without a variant of its own.
    #[serde(other)]
    Unrecognized,
}

impl RawInputEvent {
    /// Convenience constructor for a key-down event.
    pub fn key_down(key: impl Into<String>) -> Self {
        RawInputEvent::KeyDown { key: key.into() }
    }

    /// Convenience constructor for a key-up event.
    pub fn key_up(key: impl Into<String>) -> Self {
        RawInputEvent::KeyUp { key: key.into() }
    }

    /// Returns the key identifier for keyboard events.
    pub fn key(&self) -> Option<&str> {
        match self {
            RawInputEvent::KeyDown { key } | RawInputEvent::KeyUp { key } => Some(key),
            _ => None,
        }
    }

    /// Short kind name, identical to the JSON `"type"` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RawInputEvent::KeyDown { .. } => "keydown",
            RawInputEvent::KeyUp { .. } => "keyup",
            RawInputEvent::MouseMove { .. } => "mousemove",
            RawInputEvent::MouseDown { .. } => "mousedown",
            RawInputEvent::MouseUp { .. } => "mouseup",
            RawInputEvent::Wheel { .. } => "wheel",
            RawInputEvent::Unrecognized => "unrecognized",
        }
    }
}

/// Pointer button identifier used in [`RawInputEvent`].
///
/// Button names outside the five common ones deserialize to
/// [`MouseButton::Other`], so a press of any button still reaches the
/// services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_deserializes_from_dom_style_json() {
        let event: RawInputEvent =
            serde_json::from_str(r#"{"type":"keydown","key":"Shift"}"#).expect("deserialize");
        assert_eq!(event, RawInputEvent::key_down("Shift"));
        assert_eq!(event.key(), Some("Shift"));
    }

    #[test]
    fn test_mouse_down_deserializes_button_name() {
        let event: RawInputEvent =
            serde_json::from_str(r#"{"type":"mousedown","button":"middle"}"#).expect("deserialize");
        assert_eq!(
            event,
            RawInputEvent::MouseDown {
                button: MouseButton::Middle
            }
        );
        assert_eq!(event.key(), None);
    }

    #[test]
    fn test_unlisted_button_name_still_deserializes_to_mouse_down() {
        let event: RawInputEvent =
            serde_json::from_str(r#"{"type":"mousedown","button":"auxiliary"}"#)
                .expect("deserialize");
        assert_eq!(
            event,
            RawInputEvent::MouseDown {
                button: MouseButton::Other
            }
        );
        assert_eq!(event.kind(), "mousedown");
    }

    #[test]
    fn test_unknown_event_type_deserializes_to_unrecognized() {
        let event: RawInputEvent =
            serde_json::from_str(r#"{"type":"keypress"}"#).expect("deserialize");
        assert_eq!(event, RawInputEvent::Unrecognized);
        assert_eq!(event.kind(), "unrecognized");
    }

    #[test]
    fn test_serialized_tag_matches_kind() {
        let event = RawInputEvent::MouseMove { x: 3, y: 4 };
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"type":"mousemove","x":3,"y":4}"#);
        assert_eq!(event.kind(), "mousemove");
    }

    #[test]
    fn test_key_names_are_case_sensitive() {
        assert_ne!(RawInputEvent::key_down("a"), RawInputEvent::key_down("A"));
    }
}
