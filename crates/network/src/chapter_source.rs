// crates/network/src/chapter_source.rs
//! Chapter audio delivery
//!
//! One request per chapter: `GET {base}/{audio_slug}/chapter-{n}.mp3`, with
//! `n` 1-based and unpadded.

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;

/// Builds the locator for one chapter of a book
pub fn chapter_url(base_url: &str, audio_slug: &str, chapter: u32) -> String {
    format!(
        "{}/{}/chapter-{}.mp3",
        base_url.trim_end_matches('/'),
        audio_slug,
        chapter
    )
}

/// Something that can deliver the raw bytes of a chapter
///
/// The returned future owns everything it needs so it can be spawned onto a
/// runtime and aborted when superseded.
pub trait ChapterSource: Send + Sync + 'static {
    /// Locator used for the chapter (also used in logs)
    fn chapter_url(&self, audio_slug: &str, chapter: u32) -> String;

    /// Fetches the chapter payload
    fn fetch_chapter(&self, audio_slug: &str, chapter: u32) -> BoxFuture<'static, NetworkResult<Bytes>>;
}

/// Chapter source backed by the audio delivery HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpChapterSource {
    client: Client,
    base_url: String,
}

impl HttpChapterSource {
    /// Creates a source for `base_url`, which must be an absolute http(s) URL
    pub fn new(client: Client, base_url: &str) -> NetworkResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChapterSource for HttpChapterSource {
    fn chapter_url(&self, audio_slug: &str, chapter: u32) -> String {
        chapter_url(&self.base_url, audio_slug, chapter)
    }

    fn fetch_chapter(&self, audio_slug: &str, chapter: u32) -> BoxFuture<'static, NetworkResult<Bytes>> {
        let client = self.client.clone();
        let url = self.chapter_url(audio_slug, chapter);

        async move {
            log::debug!("Fetching {}", url);
            let bytes = client.get_bytes(&url).await?;
            log::debug!("Fetched {} bytes from {}", bytes.len(), url);
            Ok(bytes)
        }
        .boxed()
    }
}
