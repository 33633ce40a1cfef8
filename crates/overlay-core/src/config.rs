//! Overlay configuration.
//!
//! Defaults match the stylesheet shipped with the studio. The wasm bridge
//! accepts the same structure as camelCase JSON.

use serde::{Deserialize, Serialize};

/// Knobs shared by every overlay a host opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    /// Stacking order of the overlay container (above the canvas frame).
    pub z_index: i32,
    /// Class marker on the menu's root element. Wheel events inside an
    /// element carrying it do not dismiss the menu.
    pub overlay_class: String,
    /// Class of the zero-size positioning anchor.
    pub anchor_class: String,
    /// `KeyboardEvent.keyCode` that dismisses the menu.
    pub escape_key_code: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            z_index: 1050,
            overlay_class: "context-menu-overlay".to_string(),
            anchor_class: "context-menu-anchor".to_string(),
            escape_key_code: 27,
        }
    }
}

impl OverlayConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid overlay config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OverlayConfig::from_json(r#"{"zIndex": 2000}"#).unwrap();
        assert_eq!(
            config,
            OverlayConfig {
                z_index: 2000,
                ..OverlayConfig::default()
            }
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = OverlayConfig::from_json(r#"{"zIndex": "high"}"#).unwrap_err();
        assert!(err.starts_with("Invalid overlay config"), "{err}");
    }
}
