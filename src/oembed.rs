//! oEmbed metadata for a video.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable, LocalBoxFuture};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::BridgeConfig;
use crate::types::EmbedOptions;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum OEmbedError {
    #[error("invalid oEmbed endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to fetch oEmbed: HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode oEmbed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OEmbed {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub provider_name: String,
    pub provider_url: String,
    pub title: String,
    pub author_name: String,
    pub author_url: String,
    pub account_type: String,
    pub html: String,
    pub width: u32,
    pub height: u32,
    pub duration: u64,
    pub description: String,
    pub thumbnail_url: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_url_with_play_button: String,
    pub upload_date: String,
    pub video_id: u64,
    pub uri: String,
}

/// Build the metadata request URL: `url=<video>` followed by the embed
/// options as query parameters.
pub fn oembed_url(
    endpoint: &str,
    video_url: &str,
    options: Option<&EmbedOptions>,
) -> Result<Url, OEmbedError> {
    let mut url = Url::parse(endpoint)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("url", video_url);
        for (key, value) in options.map(EmbedOptions::to_query_pairs).unwrap_or_default() {
            query.append_pair(&key, &value);
        }
    }
    Ok(url)
}

#[derive(Clone)]
pub struct OEmbedClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OEmbedClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, OEmbedError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, OEmbedError> {
        Self::new(config.oembed_endpoint.clone())
    }

    pub async fn fetch(
        &self,
        video_url: &str,
        options: Option<&EmbedOptions>,
    ) -> Result<OEmbed, OEmbedError> {
        let url = oembed_url(&self.endpoint, video_url, options)?;
        tracing::debug!(target: "oembed", %url, "fetching oEmbed metadata");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OEmbedError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Observable state of an [`OEmbedLoader`].
#[derive(Debug, Clone, Default)]
pub struct OEmbedState {
    pub oembed: Option<OEmbed>,
    pub is_loading: bool,
    pub error: Option<Rc<OEmbedError>>,
}

/// Keeps the metadata of one video current.
///
/// Each [`OEmbedLoader::load`] aborts the request before it. Aborted requests
/// leave the state alone, so a stale request can never publish data or an
/// error over a newer one.
pub struct OEmbedLoader {
    client: OEmbedClient,
    state: Rc<RefCell<OEmbedState>>,
    in_flight: RefCell<Option<AbortHandle>>,
}

impl OEmbedLoader {
    pub fn new(client: OEmbedClient) -> Self {
        Self {
            client,
            state: Rc::new(RefCell::new(OEmbedState::default())),
            in_flight: RefCell::new(None),
        }
    }

    pub fn state(&self) -> OEmbedState {
        self.state.borrow().clone()
    }

    /// Start loading metadata for `video_url`. Returns the request for the
    /// host to drive, or `None` when there is no URL to fetch.
    pub fn load(
        &self,
        video_url: Option<&str>,
        options: Option<&EmbedOptions>,
    ) -> Option<LocalBoxFuture<'static, ()>> {
        self.abort_in_flight();
        let Some(video_url) = video_url.filter(|url| !url.is_empty()) else {
            self.state.borrow_mut().is_loading = false;
            return None;
        };
        let video_url = video_url.to_string();

        {
            let mut state = self.state.borrow_mut();
            state.oembed = None;
            state.error = None;
            state.is_loading = true;
        }

        let (abort, registration) = AbortHandle::new_pair();
        *self.in_flight.borrow_mut() = Some(abort);

        let client = self.client.clone();
        let options = options.cloned();
        let request = async move { client.fetch(&video_url, options.as_ref()).await };
        let state = Rc::clone(&self.state);

        Some(
            async move {
                let Ok(outcome) = Abortable::new(request, registration).await else {
                    tracing::debug!(target: "oembed", "request aborted");
                    return;
                };
                let mut state = state.borrow_mut();
                state.is_loading = false;
                match outcome {
                    Ok(oembed) => state.oembed = Some(oembed),
                    Err(err) => {
                        tracing::warn!(target: "oembed", %err, "oEmbed request failed");
                        state.error = Some(Rc::new(err));
                    }
                }
            }
            .boxed_local(),
        )
    }

    /// Abort the in-flight request, if any.
    pub fn cancel(&self) {
        self.abort_in_flight();
        self.state.borrow_mut().is_loading = false;
    }

    fn abort_in_flight(&self) {
        if let Some(previous) = self.in_flight.borrow_mut().take() {
            previous.abort();
        }
    }
}

impl Drop for OEmbedLoader {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_with_options() {
        let options = EmbedOptions {
            autoplay: Some(true),
            color: Some("#ff0000".into()),
            ..Default::default()
        };
        let url = oembed_url(
            "https://vimeo.com/api/oembed.json",
            "https://vimeo.com/76979871",
            Some(&options),
        )
        .unwrap();
        assert_eq!(url.path(), "/api/oembed.json");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("url".into(), "https://vimeo.com/76979871".into()));
        assert!(pairs.contains(&("autoplay".into(), "true".into())));
        assert!(pairs.contains(&("color".into(), "ff0000".into())));
    }

    #[test]
    fn builds_bare_query_without_options() {
        let url = oembed_url("https://vimeo.com/api/oembed.json", "https://vimeo.com/1", None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://vimeo.com/api/oembed.json?url=https%3A%2F%2Fvimeo.com%2F1"
        );
    }

    #[test]
    fn load_without_url_does_nothing() {
        let loader = OEmbedLoader::new(OEmbedClient::new("https://vimeo.com/api/oembed.json").unwrap());
        assert!(loader.load(None, None).is_none());
        assert!(loader.load(Some(""), None).is_none());
        assert!(!loader.state().is_loading);
    }
}
