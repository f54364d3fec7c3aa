//! oEmbed metadata retrieval and request de-duplication.
//!
//! [`EmbedCache`] sits in front of an [`EmbedFetcher`] so that blocks being
//! transformed, or deleted and added again, don't hit the proxy twice for the
//! same URL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use miette::{IntoDiagnostic, Result};
use url::Url;

use crate::classify::EmbedResponse;
use crate::config::EndpointConfig;
use crate::error::FetchError;

/// Source of oEmbed metadata for a URL.
pub trait EmbedFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<EmbedResponse, FetchError>> + Send;
}

/// Fetches through a WordPress-style `oembed/1.0/proxy` endpoint.
#[derive(Debug, Clone)]
pub struct ProxyFetcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl ProxyFetcher {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let mut endpoint = Url::parse(&config.base_url).into_diagnostic()?;
        endpoint
            .path_segments_mut()
            .map_err(|_| miette::miette!("embed endpoint {} cannot be a base URL", config.base_url))?
            .pop_if_empty()
            .extend(["oembed", "1.0", "proxy"]);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .into_diagnostic()?;

        Ok(Self { client, endpoint })
    }

    pub fn proxy_url(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", target);
        url
    }
}

impl EmbedFetcher for ProxyFetcher {
    async fn fetch(&self, url: &str) -> Result<EmbedResponse, FetchError> {
        let request = self.proxy_url(url);
        tracing::debug!(url, proxy = %request, "requesting embed");

        let response = self
            .client
            .get(request)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .json::<EmbedResponse>()
            .await
            .map_err(|e| FetchError::Decode {
                url: url.to_owned(),
                message: e.to_string(),
            })
    }
}

type PendingEmbed = Shared<BoxFuture<'static, Result<EmbedResponse, FetchError>>>;

/// Memoizes embed lookups by exact URL for the lifetime of the cache.
///
/// Callers asking for a URL that is already in flight wait on the same
/// request. Failures are dropped from the cache so a retry goes back out.
pub struct EmbedCache<F> {
    fetcher: Arc<F>,
    entries: Arc<DashMap<String, PendingEmbed>>,
}

impl<F> Clone for EmbedCache<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<F: EmbedFetcher> EmbedCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn fetch_embed(
        &self,
        url: &str,
        identifier: &str,
    ) -> Result<EmbedResponse, FetchError> {
        let pending = match self.entries.entry(url.to_owned()) {
            Entry::Occupied(entry) => {
                tracing::trace!(url, provider = identifier, "embed cache hit");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                tracing::debug!(url, provider = identifier, "embed cache miss");
                let fetcher = Arc::clone(&self.fetcher);
                let target = url.to_owned();
                let pending = async move { fetcher.fetch(&target).await }
                    .boxed()
                    .shared();
                entry.insert(pending.clone());
                pending
            }
        };

        let result = pending.await;
        if let Err(err) = &result {
            tracing::warn!(url, provider = identifier, error = %err, "embed request failed");
            self.entries
                .remove_if(url, |_, cached| cached.peek().is_some_and(Result::is_err));
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every cached lookup, e.g. when the editing session changes.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl EmbedFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<EmbedResponse, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if call < self.fail_first {
                return Err(FetchError::transport(url, "connection reset"));
            }
            Ok(EmbedResponse {
                html: Some(format!("<iframe src=\"{url}\"></iframe>")),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let cache = EmbedCache::new(CountingFetcher::default());
        let url = "https://youtu.be/abc";
        let (a, b) = tokio::join!(
            cache.fetch_embed(url, "core-embed/youtube"),
            cache.fetch_embed(url, "core-embed/youtube")
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completed_requests_are_reused() {
        let cache = EmbedCache::new(CountingFetcher::default());
        cache.fetch_embed("https://a.test/1", "core/embed").await.unwrap();
        cache.fetch_embed("https://a.test/1", "core/embed").await.unwrap();
        cache.fetch_embed("https://a.test/2", "core/embed").await.unwrap();
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_keys_are_exact_urls() {
        let cache = EmbedCache::new(CountingFetcher::default());
        cache.fetch_embed("https://a.test/1", "core/embed").await.unwrap();
        cache.fetch_embed("https://a.test/1/", "core/embed").await.unwrap();
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = EmbedCache::new(CountingFetcher {
            fail_first: 1,
            ..Default::default()
        });
        let url = "https://vimeo.com/1";
        let err = cache.fetch_embed(url, "core-embed/vimeo").await.unwrap_err();
        assert_eq!(err.target_url(), url);
        assert!(cache.is_empty());

        cache.fetch_embed(url, "core-embed/vimeo").await.unwrap();
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_forgets_results() {
        let cache = EmbedCache::new(CountingFetcher::default());
        cache.fetch_embed("https://a.test/1", "core/embed").await.unwrap();
        cache.clear();
        cache.fetch_embed("https://a.test/1", "core/embed").await.unwrap();
        assert_eq!(cache.fetcher().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_proxy_url() {
        let fetcher = ProxyFetcher::new(&EndpointConfig {
            base_url: "https://site.test/wp-json/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            fetcher.proxy_url("https://youtu.be/a?b=1&c=2").as_str(),
            "https://site.test/wp-json/oembed/1.0/proxy?url=https%3A%2F%2Fyoutu.be%2Fa%3Fb%3D1%26c%3D2"
        );
    }
}
