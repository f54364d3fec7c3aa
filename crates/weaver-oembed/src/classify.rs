//! Turning raw oEmbed proxy responses into something renderable.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::EmbedError;
use crate::markup::escape_attr;
use crate::provider::{ProviderDefinition, WORDPRESS_PROVIDER};

/// Marker present in the markup of posts embedded from a WordPress site.
pub const WP_EMBED_SIGNATURE: &str = r#"class="wp-embedded-content" data-secret"#;

/// Response body of the oEmbed proxy.
///
/// Which fields are present depends entirely on the remote provider. Some
/// plugins put the markup in `result` instead of `html`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl EmbedResponse {
    /// `html` if present, otherwise `result`.
    pub fn markup(&self) -> Option<&str> {
        non_empty(&self.html).or_else(|| non_empty(&self.result))
    }

    pub fn kind(&self) -> EmbedKind {
        non_empty(&self.kind)
            .map(EmbedKind::from_type)
            .unwrap_or_default()
    }

    pub fn provider_name(&self) -> Option<&str> {
        non_empty(&self.provider_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedKind {
    #[default]
    Rich,
    Photo,
    Video,
    Link,
    #[serde(rename = "wp-embed")]
    WordPressEmbed,
}

impl EmbedKind {
    /// Maps an oEmbed `type`. Anything unrecognised is treated as rich markup.
    pub fn from_type(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "photo" => Self::Photo,
            "video" => Self::Video,
            "link" => Self::Link,
            "wp-embed" => Self::WordPressEmbed,
            _ => Self::Rich,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rich => "rich",
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Link => "link",
            Self::WordPressEmbed => "wp-embed",
        }
    }
}

impl std::fmt::Display for EmbedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedResult {
    pub renderable_markup: String,
    pub classification: EmbedKind,
    pub provider_slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ready(EmbedResult),
    /// The markup belongs to a different provider than the one that asked for
    /// it. The caller should restart the attempt under `identifier`.
    SwitchProvider { identifier: SmolStr },
}

/// Classifies a proxy response for `url`, fetched by the attempt running under
/// `active_identifier`.
///
/// `provider` supplies the fallback title for the slug. It can be the generic
/// definition when the catalog has no entry for `active_identifier`, so the
/// WordPress check looks at the identifier itself.
pub fn classify(
    response: &EmbedResponse,
    url: &str,
    provider: &ProviderDefinition,
    active_identifier: &str,
) -> Result<Classification, EmbedError> {
    let markup = response.markup();
    let mut kind = response.kind();
    let provider_slug = normalize_slug(response.provider_name().unwrap_or(provider.title()));

    if markup.is_some_and(|m| m.contains(WP_EMBED_SIGNATURE)) {
        kind = EmbedKind::WordPressEmbed;
        if active_identifier != WORDPRESS_PROVIDER {
            tracing::debug!(url, from = active_identifier, "markup is a WordPress embed");
            return Ok(Classification::SwitchProvider {
                identifier: SmolStr::new_static(WORDPRESS_PROVIDER),
            });
        }
    }

    let renderable_markup = match (markup, kind) {
        (Some(markup), _) => markup.to_owned(),
        (None, EmbedKind::Photo) => match photo_markup(response) {
            Some(markup) => markup,
            None => return Err(empty(url)),
        },
        (None, _) => return Err(empty(url)),
    };

    Ok(Classification::Ready(EmbedResult {
        renderable_markup,
        classification: kind,
        provider_slug,
    }))
}

fn empty(url: &str) -> EmbedError {
    EmbedError::EmptyResponse {
        url: url.to_owned(),
    }
}

/// Preview markup for photo responses that carry no html of their own.
/// Full width so it sits inside the document; some "thumbnails" are the full photo.
fn photo_markup(response: &EmbedResponse) -> Option<String> {
    let src = non_empty(&response.thumbnail_url)?;
    let alt = response.title.as_deref().unwrap_or_default();
    Some(format!(
        r#"<p><img src="{}" alt="{}" width="100%"/></p>"#,
        escape_attr(src),
        escape_attr(alt)
    ))
}

/// Kebab-case slug for a provider name: lowercase words joined by `-`.
///
/// Words break on anything that isn't alphanumeric and on case changes, so
/// `"YouTube"` becomes `"you-tube"` and `"My Cool Host"` becomes `"my-cool-host"`.
pub fn normalize_slug(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // fooBar, or the last capital of an acronym: HTMLParser -> html-parser
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("-")
}
