//! Embedded static resources.
//!
//! The live-reload client is minified by `build.rs` (with the error overlay
//! stylesheet inlined) and served from memory by the dev server.

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL path the dev server answers with the live-reload client.
    pub const RELOAD_JS_PATH: &str = "/__gust/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__GUST_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const RELOAD_JS: Template<ReloadVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/reload.min.js")));

    /// `<script>` tag referencing the client, injected into served HTML.
    pub fn script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_PATH}" defer></script>"#)
    }

}
