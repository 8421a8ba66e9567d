//! Payload markup injected into each page.

use minijinja::{context, Environment};

/// Context for rendering the injection payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PayloadContext {
    /// Name of the `window` global holding the playlist
    pub playlist_var: String,
    /// Playlist as a script-safe JSON array
    pub playlist_json: String,
    /// Player script reference
    pub script_src: String,
    /// Include the console diagnostic script
    pub debug_script: bool,
}

/// Payload renderer using minijinja.
///
/// Templates are registered without a file extension so that no auto-escaping
/// applies; every interpolated value is validated or JSON-encoded upstream.
pub struct PayloadRenderer {
    env: Environment<'static>,
}

impl PayloadRenderer {
    /// Create a renderer with the built-in payload template.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);

        env.add_template_owned("debug".to_string(), DEBUG_TEMPLATE.to_string())
            .expect("Failed to add debug template");

        env.add_template_owned("payload".to_string(), PAYLOAD_TEMPLATE.to_string())
            .expect("Failed to add payload template");

        Self { env }
    }

    /// Render the payload for one page.
    pub fn render(&self, context: &PayloadContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("payload")?;

        tmpl.render(context! {
            playlist_var => &context.playlist_var,
            playlist_json => &context.playlist_json,
            script_src => &context.script_src,
            debug_script => context.debug_script,
        })
    }
}

impl Default for PayloadRenderer {
    fn default() -> Self {
        Self::new()
    }
}

const DEBUG_TEMPLATE: &str = r#"<script>
  console.log('Music player injection loaded');
  console.log('Page URL:', window.location.href);
</script>
"#;

const PAYLOAD_TEMPLATE: &str = r#"{% if debug_script %}
{% include "debug" %}

{% endif %}
<script>
  // Generated music file list
  window.{{ playlist_var }} = {{ playlist_json }};
  console.log(`Auto-loaded music files: ${window.{{ playlist_var }}.length}`);
</script>
<script src="{{ script_src }}"></script>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context(debug_script: bool) -> PayloadContext {
        PayloadContext {
            playlist_var: "musicFileList".to_string(),
            playlist_json: r#"["a.mp3","B.MP3"]"#.to_string(),
            script_src: "assets/music_player.js".to_string(),
            debug_script,
        }
    }

    #[test]
    fn renders_playlist_and_script_tag() {
        let renderer = PayloadRenderer::new();

        let payload = renderer.render(&context(false)).unwrap();

        assert_eq!(
            payload,
            r#"<script>
  // Generated music file list
  window.musicFileList = ["a.mp3","B.MP3"];
  console.log(`Auto-loaded music files: ${window.musicFileList.length}`);
</script>
<script src="assets/music_player.js"></script>"#
        );
    }

    #[test]
    fn includes_debug_script_first() {
        let renderer = PayloadRenderer::new();

        let payload = renderer.render(&context(true)).unwrap();

        let debug = payload.find("Music player injection loaded").unwrap();
        let playlist = payload.find("window.musicFileList =").unwrap();
        let script = payload.find(r#"<script src="assets/music_player.js">"#).unwrap();

        assert!(debug < playlist);
        assert!(playlist < script);
    }

    #[test]
    fn does_not_escape_paths() {
        let renderer = PayloadRenderer::new();

        let payload = renderer.render(&context(false)).unwrap();

        assert!(!payload.contains("&#x2f;"));
    }
}
