//! The keypad host, as seen from the engine.
//!
//! The host owns the physical keys and the settings UI. It tells the engine
//! when a key appears, disappears, is pressed, or has its settings edited
//! ([`HostEvent`]), and it accepts rendered images per key ([`BitmapSink`]).
//! Settings arrive as a flat JSON object; [`KeySettings`] picks out the
//! fields the engine understands and ignores the rest.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::canvas::KeyFrame;
use crate::error::Result;
use crate::reading::parse_leading_float;

/// Flat settings object as the host stores it.
pub type SettingsMap = serde_json::Map<String, Value>;

// =============================================================================
// Key Identity
// =============================================================================

/// Opaque key-context identifier assigned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for KeyId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl From<String> for KeyId {
    fn from(id: String) -> Self { Self(id) }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// =============================================================================
// Events
// =============================================================================

/// Notifications from the host, in the order it sends them.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    KeyShown { key: KeyId, settings: SettingsMap },
    KeyHidden { key: KeyId },
    KeyPressed { key: KeyId },
    SettingsChanged { key: KeyId, settings: SettingsMap },
}

impl HostEvent {
    pub const fn key(&self) -> &KeyId {
        match self {
            Self::KeyShown { key, .. }
            | Self::KeyHidden { key }
            | Self::KeyPressed { key }
            | Self::SettingsChanged { key, .. } => key,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// The recognized subset of a key's settings.
///
/// A `None` field was not present and leaves the binding unchanged. The range
/// bounds are doubly optional: `Some(None)` means the field was present but
/// empty (or not a number) and clears the override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    pub sensor_name: Option<String>,
    pub sensor_type: Option<String>,
    pub sensor_foreground: Option<String>,
    pub sensor_background: Option<String>,
    #[serde(deserialize_with = "range_bound")]
    pub sensor_minimum: Option<Option<f64>>,
    #[serde(deserialize_with = "range_bound")]
    pub sensor_maximum: Option<Option<f64>>,
}

impl KeySettings {
    pub fn from_map(settings: &SettingsMap) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(settings.clone()))
    }
}

/// Numbers pass through; strings are read like `parseFloat`; anything else
/// (`""`, `null`, `"abc"`) clears.
fn range_bound<'de, D>(deserializer: D) -> std::result::Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let bound = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(&s),
        _ => None,
    };
    Ok(Some(bound))
}

// =============================================================================
// Output
// =============================================================================

/// Receives every rendered key image.
pub trait BitmapSink {
    fn push_bitmap(
        &mut self,
        key: &KeyId,
        frame: &KeyFrame,
    ) -> Result<()>;
}

/// Keeps every pushed frame in memory, in push order.
#[derive(Default)]
pub struct MemorySink {
    pushes: Vec<(KeyId, KeyFrame)>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.pushes.len() }

    pub fn is_empty(&self) -> bool { self.pushes.is_empty() }

    pub fn pushes_for(
        &self,
        key: &KeyId,
    ) -> usize {
        self.pushes.iter().filter(|(k, _)| k == key).count()
    }

    pub fn last_for(
        &self,
        key: &KeyId,
    ) -> Option<&KeyFrame> {
        self.pushes.iter().rev().find(|(k, _)| k == key).map(|(_, frame)| frame)
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyId> { self.pushes.iter().map(|(k, _)| k) }

    pub fn clear(&mut self) { self.pushes.clear(); }
}

impl BitmapSink for MemorySink {
    fn push_bitmap(
        &mut self,
        key: &KeyId,
        frame: &KeyFrame,
    ) -> Result<()> {
        self.pushes.push((key.clone(), frame.clone()));
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::canvas::KeyCanvas;

    fn settings(value: Value) -> KeySettings {
        match value {
            Value::Object(map) => KeySettings::from_map(&map).unwrap(),
            _ => panic!("settings must be an object"),
        }
    }

    #[test]
    fn test_all_recognized_fields() {
        let s = settings(json!({
            "sensor_name": "Intel Core i7/Load/CPU Total",
            "sensor_type": "line",
            "sensor_foreground": "#00ff00",
            "sensor_background": "#000000",
            "sensor_minimum": "0",
            "sensor_maximum": "100",
        }));
        assert_eq!(s.sensor_name.as_deref(), Some("Intel Core i7/Load/CPU Total"));
        assert_eq!(s.sensor_type.as_deref(), Some("line"));
        assert_eq!(s.sensor_foreground.as_deref(), Some("#00ff00"));
        assert_eq!(s.sensor_minimum, Some(Some(0.0)));
        assert_eq!(s.sensor_maximum, Some(Some(100.0)));
    }

    #[test]
    fn test_missing_fields_leave_bindings_unchanged() {
        let s = settings(json!({ "sensor_type": "knob", "unrelated": 3 }));
        assert_eq!(s.sensor_name, None);
        assert_eq!(s.sensor_minimum, None, "Absent bound must not clear");
    }

    #[test]
    fn test_empty_bound_clears() {
        let s = settings(json!({ "sensor_minimum": "", "sensor_maximum": null }));
        assert_eq!(s.sensor_minimum, Some(None));
        assert_eq!(s.sensor_maximum, Some(None));
    }

    #[test]
    fn test_bound_accepts_numbers_and_units() {
        let s = settings(json!({ "sensor_minimum": 20, "sensor_maximum": "95 °C" }));
        assert_eq!(s.sensor_minimum, Some(Some(20.0)));
        assert_eq!(s.sensor_maximum, Some(Some(95.0)));
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let map = match json!({ "sensor_name": 5 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(KeySettings::from_map(&map).is_err());
    }

    #[test]
    fn test_event_key() {
        let key = KeyId::from("k1");
        assert_eq!(HostEvent::KeyPressed { key: key.clone() }.key(), &key);
        assert_eq!(
            HostEvent::SettingsChanged {
                key: key.clone(),
                settings: SettingsMap::new()
            }
            .key(),
            &key
        );
    }

    #[test]
    fn test_key_id_deserializes_from_string() {
        let key: KeyId = serde_json::from_str("\"ABC123\"").unwrap();
        assert_eq!(key.as_str(), "ABC123");
        assert_eq!(key.to_string(), "ABC123");
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        let frame = KeyCanvas::square(4).snapshot();
        let (a, b) = (KeyId::from("a"), KeyId::from("b"));

        sink.push_bitmap(&a, &frame).unwrap();
        sink.push_bitmap(&b, &frame).unwrap();
        sink.push_bitmap(&a, &frame).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.pushes_for(&a), 2);
        assert!(sink.last_for(&b).is_some());
        assert_eq!(sink.keys().cloned().collect::<Vec<_>>(), [a.clone(), b, a]);
    }
}
