//! Hot Reload Message Protocol
//!
//! JSON messages pushed to browser clients over WebSocket, tagged by `type`:
//!
//! - `connected`: handshake complete
//! - `reload`: full page reload
//! - `css`: re-fetch the listed stylesheets in place
//! - `error` / `clear_error`: show or hide the error overlay

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Full page reload
    Reload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stylesheet-only refresh
    Css {
        /// URL paths of the rewritten stylesheets (e.g. `/css/index.css`)
        paths: Vec<String>,
    },

    /// A task failed (display overlay, no reload)
    Error { task: String, message: String },

    /// The failing tasks recovered
    #[serde(rename = "clear_error")]
    ClearError,
}

impl HotReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(reason: Option<String>) -> Self {
        Self::Reload { reason }
    }

    pub fn css(paths: Vec<String>) -> Self {
        Self::Css { paths }
    }

    pub fn error(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        // Every variant is plain strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_serialization() {
        assert_eq!(HotReloadMessage::reload(None).to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            HotReloadMessage::reload(Some("html".into())).to_json(),
            r#"{"type":"reload","reason":"html"}"#
        );
    }

    #[test]
    fn test_css_serialization() {
        let json = HotReloadMessage::css(vec!["/css/index.css".into()]).to_json();
        assert_eq!(json, r#"{"type":"css","paths":["/css/index.css"]}"#);
    }

    #[test]
    fn test_error_and_clear() {
        let json = HotReloadMessage::error("styles", "bad").to_json();
        assert_eq!(json, r#"{"type":"error","task":"styles","message":"bad"}"#);
        assert_eq!(HotReloadMessage::ClearError.to_json(), r#"{"type":"clear_error"}"#);
    }

    #[test]
    fn test_connected_carries_version() {
        let json = HotReloadMessage::connected().to_json();
        let parsed: HotReloadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, HotReloadMessage::connected());
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }
}
