use thiserror::Error;
use url::Url;

const VIMEO_HOSTS: &[&str] = &["vimeo.com", "www.vimeo.com", "player.vimeo.com"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimeoVideo {
    url: Url,
    video_id: u64,
}

impl VimeoVideo {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn video_id(&self) -> u64 {
        self.video_id
    }
}

/// What a player handle was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSource {
    Missing,
    Invalid(String),
    Valid(VimeoVideo),
}

impl PlayerSource {
    pub fn video(&self) -> Option<&VimeoVideo> {
        match self {
            PlayerSource::Valid(video) => Some(video),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PlayerSource::Valid(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error("source is empty")]
    Empty,
    #[error("source could not be parsed as a URL: {0}")]
    Malformed(#[from] url::ParseError),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("not a Vimeo host: {0}")]
    ForeignHost(String),
    #[error("no video id in path")]
    MissingVideoId,
}

pub fn parse_source(raw: Option<&str>) -> PlayerSource {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return PlayerSource::Missing;
    };
    match parse_vimeo_url(raw) {
        Ok(video) => PlayerSource::Valid(video),
        Err(err) => {
            tracing::debug!(target: "bridge", source = raw, %err, "rejecting player source");
            PlayerSource::Invalid(raw.to_string())
        }
    }
}

/// Accepts `vimeo.com/<id>`, `player.vimeo.com/video/<id>` and channel or
/// group paths that contain a numeric id. A missing scheme means https.
pub fn parse_vimeo_url(raw: &str) -> Result<VimeoVideo, SourceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SourceError::Empty);
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)?
    } else {
        Url::parse(&format!("https://{trimmed}"))?
    };

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(SourceError::UnsupportedScheme(other.to_string())),
    }

    let host = url.host_str().unwrap_or_default();
    if !VIMEO_HOSTS.contains(&host) {
        return Err(SourceError::ForeignHost(host.to_string()));
    }

    let mut segments = url.path_segments().into_iter().flatten();
    let video_id = if host == "player.vimeo.com" {
        match (segments.next(), segments.next()) {
            (Some("video"), Some(id)) => id.parse::<u64>().ok(),
            _ => None,
        }
    } else {
        segments
            .filter(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
            .find_map(|segment| segment.parse::<u64>().ok())
    };
    let video_id = video_id.ok_or(SourceError::MissingVideoId)?;

    Ok(VimeoVideo { url, video_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_url() {
        let video = parse_vimeo_url("https://vimeo.com/76979871").unwrap();
        assert_eq!(video.video_id(), 76979871);
        assert_eq!(video.url().as_str(), "https://vimeo.com/76979871");
    }

    #[test]
    fn parses_player_and_channel_urls() {
        assert_eq!(
            parse_vimeo_url("https://player.vimeo.com/video/123456?h=abc")
                .unwrap()
                .video_id(),
            123456
        );
        assert_eq!(
            parse_vimeo_url("vimeo.com/channels/staffpicks/987654")
                .unwrap()
                .video_id(),
            987654
        );
        assert_eq!(
            parse_vimeo_url("http://www.vimeo.com/groups/shortfilms/videos/42")
                .unwrap()
                .video_id(),
            42
        );
    }

    #[test]
    fn rejects_foreign_or_idless_urls() {
        assert!(matches!(
            parse_vimeo_url("https://youtube.com/watch?v=1"),
            Err(SourceError::ForeignHost(_))
        ));
        assert_eq!(
            parse_vimeo_url("https://vimeo.com/channels/staffpicks"),
            Err(SourceError::MissingVideoId)
        );
        assert!(matches!(
            parse_vimeo_url("ftp://vimeo.com/1"),
            Err(SourceError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn distinguishes_missing_from_invalid() {
        assert_eq!(parse_source(None), PlayerSource::Missing);
        assert_eq!(parse_source(Some("  ")), PlayerSource::Missing);
        assert_eq!(
            parse_source(Some("not a url")),
            PlayerSource::Invalid("not a url".into())
        );
        assert!(parse_source(Some("https://vimeo.com/1")).is_valid());
    }
}
