use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoQuality {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "2K")]
    Qhd2k,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "540p")]
    P540,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "240p")]
    P240,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayButtonPosition {
    Auto,
    Bottom,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preload {
    Metadata,
    MetadataOnHover,
    Auto,
    AutoOnHover,
    None,
}

/// Options handed to the remote player constructor.
///
/// The bridge does not interpret these; they are serialized as-is into the
/// player bootstrap and into oEmbed queries. Field names follow the player's
/// embed parameter names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airplay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audiotrack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autopause: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapters: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromecast: Option<bool>,
    /// Accent color, with or without a leading `#`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "list_or_joined"
    )]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_quality: Option<VideoQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_markers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_params: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<bool>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_playback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_quality: Option<VideoQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_button_position: Option<PlayButtonPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playsinline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload: Option<Preload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<VideoQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_selector: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipping_forward: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texttrack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmute_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vimeo_logo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_full_video: Option<bool>,
}

impl EmbedOptions {
    /// Flatten the options into query parameters.
    ///
    /// Booleans become `"true"`/`"false"`, `color` loses its leading `#` and
    /// list values are comma-joined. Unset options are omitted.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let Ok(Value::Object(fields)) = serde_json::to_value(self) else {
            return Vec::new();
        };

        fields
            .into_iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::Null => return None,
                    Value::Bool(flag) => if flag { "true" } else { "false" }.to_string(),
                    Value::Number(number) => number.to_string(),
                    Value::String(text) if key == "color" => {
                        text.strip_prefix('#').unwrap_or(&text).to_string()
                    }
                    Value::String(text) => text,
                    Value::Array(items) => items
                        .iter()
                        .map(|item| match item {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    Value::Object(_) => return None,
                };
                Some((key, rendered))
            })
            .collect()
    }

    /// Parse options back out of an `application/x-www-form-urlencoded`
    /// query. Unknown keys (such as `url`) are ignored.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query)
    }
}

fn list_or_joined<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::List(items) => Some(items),
        Repr::Joined(joined) => Some(joined.split(',').map(str::to_string).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_unset_fields_when_serialized() {
        let options = EmbedOptions {
            autoplay: Some(true),
            loop_playback: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({ "autoplay": true, "loop": false }));
    }

    #[test]
    fn query_pairs_normalize_values() {
        let options = EmbedOptions {
            color: Some("#00adef".into()),
            muted: Some(false),
            start_time: Some(12.5),
            colors: Some(vec!["000000".into(), "00adef".into()]),
            quality: Some(VideoQuality::P720),
            ..Default::default()
        };
        let pairs = options.to_query_pairs();
        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("color"), Some("00adef"));
        assert_eq!(lookup("muted"), Some("false"));
        assert_eq!(lookup("start_time"), Some("12.5"));
        assert_eq!(lookup("colors"), Some("000000,00adef"));
        assert_eq!(lookup("quality"), Some("720p"));
        assert_eq!(lookup("autoplay"), None);
    }

    #[test]
    fn parses_colors_from_json_array() {
        let options: EmbedOptions =
            serde_json::from_value(json!({ "colors": ["a", "b"], "initial_quality": "4K" }))
                .unwrap();
        assert_eq!(options.colors, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(options.initial_quality, Some(VideoQuality::Uhd4k));
    }
}
