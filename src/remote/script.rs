//! Player document and bootstrap script generation.
//!
//! The bootstrap creates the player, installs one forwarding listener per
//! event, exposes `window.__execCommand` and finally posts `onReady`. The
//! command table is generated from [`CommandName`], so its names and arities
//! are the same ones the host encodes.

use serde_json::{Map, Value};
use url::Url;

use crate::config::BridgeConfig;
use crate::protocol::{error_code, CommandName};
use crate::source::PlayerSource;
use crate::types::{EmbedOptions, EventKind};

/// Everything a transport needs to stand up a remote context.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDocument {
    /// Complete HTML page for web view transports.
    pub html: String,
    /// The bootstrap on its own, for transports that evaluate scripts
    /// directly. `None` when the source is not playable.
    pub bootstrap: Option<String>,
}

impl PlayerDocument {
    pub fn is_playable(&self) -> bool {
        self.bootstrap.is_some()
    }
}

/// Render the document for `source`. Missing and invalid sources produce the
/// placeholder page and no bootstrap.
pub fn render_document(
    source: &PlayerSource,
    options: &EmbedOptions,
    config: &BridgeConfig,
) -> PlayerDocument {
    match source {
        PlayerSource::Valid(video) => {
            let bootstrap = bootstrap_script(video.url(), options, &config.container_id);
            PlayerDocument {
                html: player_html(&bootstrap, config),
                bootstrap: Some(bootstrap),
            }
        }
        PlayerSource::Missing | PlayerSource::Invalid(_) => PlayerDocument {
            html: INVALID_SOURCE_HTML.to_string(),
            bootstrap: None,
        },
    }
}

pub fn bootstrap_script(source: &Url, options: &EmbedOptions, container_id: &str) -> String {
    let mut params = match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    params.insert("url".into(), Value::String(source.to_string()));

    let events: Vec<Value> = EventKind::ALL
        .iter()
        .map(|kind| Value::String(kind.as_str().to_string()))
        .collect();
    let empty: Vec<Value> = EventKind::ALL
        .iter()
        .filter(|kind| !kind.carries_payload())
        .map(|kind| Value::String(kind.as_str().to_string()))
        .collect();

    BOOTSTRAP_TEMPLATE
        .replace("__CONTAINER_ID__", &Value::String(container_id.to_string()).to_string())
        .replace("__PLAYER_OPTIONS__", &Value::Object(params).to_string())
        .replace("__EVENT_NAMES__", &Value::Array(events).to_string())
        .replace("__EMPTY_EVENTS__", &Value::Array(empty).to_string())
        .replace("__COMMAND_TABLE__", &command_table())
        .replace("__COMMAND_NOT_FOUND__", &error_code::COMMAND_NOT_FOUND.to_string())
        .replace("__EXECUTION_FAILED__", &error_code::EXECUTION_FAILED.to_string())
}

/// Script that hands one serialized envelope to the remote dispatcher.
pub fn command_injection(envelope_json: &str) -> String {
    format!("window.__execCommand && window.__execCommand({envelope_json}); true;")
}

fn command_table() -> String {
    let mut table = String::new();
    for name in CommandName::ALL {
        let entry = match name {
            CommandName::Destroy => {
                "    destroy: function () { eventNames.forEach(unforward); return player.destroy(); },\n"
                    .to_string()
            }
            CommandName::Off => "    off: function (name) { unforward(name); },\n".to_string(),
            _ => {
                let params = (0..name.arity())
                    .map(|index| format!("a{index}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("    {name}: function ({params}) {{ return player.{name}({params}); }},\n")
            }
        };
        table.push_str(&entry);
    }
    table
}

fn player_html(bootstrap: &str, config: &BridgeConfig) -> String {
    let container_id = html_escape::encode_double_quoted_attribute(&config.container_id);
    let player_api = html_escape::encode_double_quoted_attribute(&config.player_api_url);
    let css_id = css_identifier(&config.container_id);
    // Keep the inline script from closing its own tag.
    let inline = bootstrap.replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no">
    <style>
      * {{ margin: 0; padding: 0; box-sizing: border-box; }}
      body {{ background-color: #000; overflow: hidden; }}
      #{css_id} {{ width: 100%; height: 100vh; }}
      iframe {{ width: 100%; height: 100%; }}
    </style>
    <script src="{player_api}"></script>
  </head>
  <body>
    <div id="{container_id}"></div>
    <script>
{inline}
    </script>
  </body>
</html>
"#
    )
}

fn css_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

const INVALID_SOURCE_HTML: &str = r#"<html><body style="margin: 0; background-color: #000;"><div style="width: 100%; height: 100vh; display: flex; justify-content: center; align-items: center; color: #fff;">Invalid Vimeo URL</div></body></html>"#;

const BOOTSTRAP_TEMPLATE: &str = r#"(function () {
  'use strict';

  var containerId = __CONTAINER_ID__;
  var playerOptions = __PLAYER_OPTIONS__;
  var eventNames = __EVENT_NAMES__;
  var emptyEvents = __EMPTY_EVENTS__;

  function send(message) {
    var raw = JSON.stringify(message);
    if (window.ReactNativeWebView && window.ReactNativeWebView.postMessage) {
      window.ReactNativeWebView.postMessage(raw);
    } else if (window.ipc && window.ipc.postMessage) {
      window.ipc.postMessage(raw);
    } else if (window.parent && window.parent !== window) {
      window.parent.postMessage(raw, '*');
    }
  }

  function describe(err) {
    return err && err.message ? err.message : String(err);
  }

  function reply(id, data) {
    if (id === undefined || id === null) {
      return;
    }
    send({ type: 'commandResult', id: id, data: data === undefined ? null : data });
  }

  function fail(id, code, message) {
    if (id === undefined || id === null) {
      return;
    }
    send({ type: 'error', id: id, error: { code: code, message: message } });
  }

  var player = new Vimeo.Player(containerId, playerOptions);
  var forwarders = {};
  var layoutDone = false;

  function fillContainer() {
    if (layoutDone) {
      return;
    }
    layoutDone = true;
    if (typeof document === 'undefined') {
      return;
    }
    var iframe = document.querySelector('iframe');
    if (iframe) {
      iframe.style.width = '100%';
      iframe.style.height = '100%';
    }
  }

  function forward(name) {
    var handler = function (data) {
      if (name === 'loaded') {
        fillContainer();
      }
      var empty = data === undefined || emptyEvents.indexOf(name) >= 0;
      send({ type: name, data: empty ? null : data });
    };
    forwarders[name] = handler;
    player.on(name, handler);
  }

  function unforward(name) {
    var handler = forwarders[name];
    if (handler) {
      player.off(name, handler);
      delete forwarders[name];
    }
  }

  var commands = {
__COMMAND_TABLE__  };

  window.__execCommand = function (envelope) {
    var id = envelope ? envelope.id : undefined;
    try {
      var name = envelope.command;
      var args = envelope.args || [];
      if (!Object.prototype.hasOwnProperty.call(commands, name)) {
        fail(id, __COMMAND_NOT_FOUND__, 'Command not found: ' + name);
        return;
      }
      var result = commands[name].apply(null, args);
      if (result && typeof result.then === 'function') {
        result.then(
          function (data) { reply(id, data); },
          function (err) { fail(id, __EXECUTION_FAILED__, describe(err)); }
        );
      } else {
        reply(id, result);
      }
    } catch (err) {
      fail(id, __EXECUTION_FAILED__, 'Execution failed: ' + describe(err));
    }
  };

  eventNames.forEach(forward);
  send({ type: 'onReady', data: null });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_source;

    fn video() -> Url {
        Url::parse("https://vimeo.com/76979871").unwrap()
    }

    #[test]
    fn bootstrap_embeds_options_and_url() {
        let options = EmbedOptions {
            autoplay: Some(true),
            color: Some("#00adef".into()),
            ..Default::default()
        };
        let script = bootstrap_script(&video(), &options, "vimeo-player");
        assert!(script.contains(r#"var containerId = "vimeo-player";"#));
        assert!(script.contains(r#""autoplay":true"#));
        assert!(script.contains(r##""color":"#00adef""##));
        assert!(script.contains(r#""url":"https://vimeo.com/76979871""#));
        for placeholder in [
            "__CONTAINER_ID__",
            "__PLAYER_OPTIONS__",
            "__EVENT_NAMES__",
            "__EMPTY_EVENTS__",
            "__COMMAND_TABLE__",
            "__COMMAND_NOT_FOUND__",
            "__EXECUTION_FAILED__",
        ] {
            assert!(!script.contains(placeholder), "unreplaced {placeholder}");
        }
    }

    #[test]
    fn command_table_matches_arity() {
        let table = command_table();
        assert!(table.contains("setVolume: function (a0) { return player.setVolume(a0); }"));
        assert!(table.contains("getDuration: function () { return player.getDuration(); }"));
        for name in CommandName::ALL {
            assert!(table.contains(&format!("    {name}: function")), "missing {name}");
        }
    }

    #[test]
    fn invalid_source_renders_placeholder() {
        let document = render_document(
            &parse_source(Some("https://example.com/nope")),
            &EmbedOptions::default(),
            &BridgeConfig::default(),
        );
        assert!(!document.is_playable());
        assert!(document.html.contains("Invalid Vimeo URL"));
    }

    #[test]
    fn html_escapes_inline_script_terminators() {
        let options = EmbedOptions {
            texttrack: Some("</script><b>".into()),
            ..Default::default()
        };
        let document = render_document(
            &parse_source(Some("https://vimeo.com/76979871")),
            &options,
            &BridgeConfig::default(),
        );
        assert!(document.is_playable());
        assert_eq!(document.html.matches("</script>").count(), 2);
        assert!(document
            .html
            .contains(r#"<script src="https://player.vimeo.com/api/player.js"></script>"#));
    }

    #[test]
    fn injection_wraps_envelope() {
        assert_eq!(
            command_injection(r#"{"command":"play","args":[]}"#),
            r#"window.__execCommand && window.__execCommand({"command":"play","args":[]}); true;"#
        );
    }
}
