use miette::Diagnostic;
use thiserror::Error;

/// Failure talking to the oEmbed proxy.
///
/// Cloneable so a single failed request can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FetchError {
    #[error("embed request for {url} failed: {message}")]
    #[diagnostic(code(oembed::fetch::transport))]
    Transport { url: String, message: String },

    #[error("embed proxy answered {status} for {url}")]
    #[diagnostic(code(oembed::fetch::status))]
    Status { url: String, status: u16 },

    #[error("could not decode embed response for {url}: {message}")]
    #[diagnostic(code(oembed::fetch::decode))]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn target_url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => {
                url
            }
        }
    }
}

/// Everything that can go wrong during a single embed attempt.
///
/// None of these are fatal; they are scoped to the attempt and handed back to
/// whoever is presenting it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EmbedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error("no embeddable markup returned for {url}")]
    #[diagnostic(
        code(oembed::empty_response),
        help("the provider answered but has nothing to preview")
    )]
    EmptyResponse { url: String },

    #[error("malformed embed URL {url:?}: {reason}")]
    #[diagnostic(code(oembed::malformed_url))]
    MalformedUrl { url: String, reason: String },
}

impl EmbedError {
    /// Whether resubmitting the same URL may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("invalid pattern {pattern:?} for provider {identifier}")]
    #[diagnostic(code(oembed::catalog::pattern))]
    Pattern {
        identifier: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("provider {0} is registered more than once")]
    #[diagnostic(code(oembed::catalog::duplicate))]
    Duplicate(String),

    #[error("failed to read catalog file {path}")]
    #[diagnostic(code(oembed::catalog::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file {path}")]
    #[diagnostic(code(oembed::catalog::parse))]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
