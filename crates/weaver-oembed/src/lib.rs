//! Weaver oEmbed
//!
//! Figures out which provider handles a pasted URL, fetches its oEmbed data
//! through the site's proxy, and classifies the response into markup the
//! editor can render.
//!
//! ```ignore
//! use weaver_oembed::{catalog, resolve_provider};
//!
//! let provider = resolve_provider("https://youtu.be/dQw4w9WgXcQ", catalog::builtin());
//! assert_eq!(provider.identifier(), Some("core-embed/youtube"));
//! ```

pub mod attempt;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod link;
pub mod markup;
pub mod provider;
pub mod telemetry;

pub use crate::attempt::{
    CancellationFlag, EmbedAttempt, EmbedEvent, EmbedSink, EmbedState, Transition, run_attempt,
};
pub use crate::classify::{
    Classification, EmbedKind, EmbedResponse, EmbedResult, classify, normalize_slug,
};
pub use crate::config::Config;
pub use crate::error::{CatalogError, EmbedError, FetchError};
pub use crate::fetch::{EmbedCache, EmbedFetcher, ProxyFetcher};
pub use crate::provider::{
    Catalog, GENERIC_PROVIDER, ProviderDefinition, ProviderSpec, ResolutionResult,
    WORDPRESS_PROVIDER, resolve_provider, should_switch_provider,
};
