//! Provider definitions and URL → provider resolution.
//!
//! A [`Catalog`] is built once at startup and passed around by reference.
//! Resolution walks the common tier, then the other tier, and returns the
//! first provider with a pattern that matches the URL.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::CatalogError;

/// Identifier of the catch-all embed handler.
pub const GENERIC_PROVIDER: &str = "core/embed";
/// Identifier of the WordPress embed handler. It has no patterns: WordPress
/// sites are only recognised from the markup the proxy returns.
pub const WORDPRESS_PROVIDER: &str = "core-embed/wordpress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderIcon {
    #[default]
    #[serde(rename = "embed-generic")]
    Generic,
    #[serde(rename = "embed-post")]
    Post,
    #[serde(rename = "embed-video")]
    Video,
    #[serde(rename = "embed-photo")]
    Photo,
    #[serde(rename = "embed-audio")]
    Audio,
}

impl ProviderIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "embed-generic",
            Self::Post => "embed-post",
            Self::Video => "embed-video",
            Self::Photo => "embed-photo",
            Self::Audio => "embed-audio",
        }
    }
}

/// Priority group of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Common,
    Other,
}

/// Uncompiled provider description, as registered or read from a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub identifier: SmolStr,
    pub title: SmolStr,
    #[serde(default)]
    pub icon: ProviderIcon,
    #[serde(default)]
    pub keywords: Vec<SmolStr>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A provider with its patterns compiled, case-insensitive.
#[derive(Debug, Clone)]
pub struct ProviderDefinition {
    identifier: SmolStr,
    title: SmolStr,
    icon: ProviderIcon,
    keywords: Vec<SmolStr>,
    patterns: Vec<Regex>,
}

impl ProviderDefinition {
    pub fn compile(spec: ProviderSpec) -> Result<Self, CatalogError> {
        let patterns = spec
            .patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CatalogError::Pattern {
                        identifier: spec.identifier.to_string(),
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            identifier: spec.identifier,
            title: spec.title,
            icon: spec.icon,
            keywords: spec.keywords,
            patterns,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> ProviderIcon {
        self.icon
    }

    pub fn keywords(&self) -> &[SmolStr] {
        &self.keywords
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// True when any pattern matches. A provider without patterns never claims a URL.
    pub fn claims(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }
}

/// Ordered two-tier provider catalog plus the generic fallback.
#[derive(Debug, Clone)]
pub struct Catalog {
    common: Vec<ProviderDefinition>,
    other: Vec<ProviderDefinition>,
    generic: ProviderDefinition,
}

impl Catalog {
    pub fn new(common: Vec<ProviderSpec>, other: Vec<ProviderSpec>) -> Result<Self, CatalogError> {
        let generic = ProviderDefinition::compile(ProviderSpec {
            identifier: SmolStr::new_static(GENERIC_PROVIDER),
            title: SmolStr::new_static("Embed"),
            icon: ProviderIcon::Generic,
            keywords: Vec::new(),
            patterns: Vec::new(),
        })?;

        let mut seen = HashSet::new();
        seen.insert(generic.identifier.clone());
        let mut compile_tier = |specs: Vec<ProviderSpec>| {
            specs
                .into_iter()
                .map(|spec| {
                    if !seen.insert(spec.identifier.clone()) {
                        return Err(CatalogError::Duplicate(spec.identifier.to_string()));
                    }
                    ProviderDefinition::compile(spec)
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let common = compile_tier(common)?;
        let other = compile_tier(other)?;

        Ok(Self {
            common,
            other,
            generic,
        })
    }

    pub fn tier(&self, tier: Tier) -> &[ProviderDefinition] {
        match tier {
            Tier::Common => &self.common,
            Tier::Other => &self.other,
        }
    }

    /// All registered providers in resolution order. Excludes the generic fallback.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderDefinition> {
        self.common.iter().chain(self.other.iter())
    }

    pub fn generic(&self) -> &ProviderDefinition {
        &self.generic
    }

    pub fn get(&self, identifier: &str) -> Option<&ProviderDefinition> {
        if identifier == self.generic.identifier() {
            return Some(&self.generic);
        }
        self.providers().find(|p| p.identifier() == identifier)
    }

    /// Looks up a provider, falling back to the generic definition for unknown identifiers.
    pub fn get_or_generic(&self, identifier: &str) -> &ProviderDefinition {
        self.get(identifier).unwrap_or(&self.generic)
    }

    pub fn len(&self) -> usize {
        self.common.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of matching a URL against a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionResult {
    NoMatch,
    Matched(SmolStr),
}

impl ResolutionResult {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::NoMatch => None,
            Self::Matched(identifier) => Some(identifier),
        }
    }
}

/// Raw matcher: first provider, common tier first, with a pattern matching `url`.
/// Does not apply the generic fallback.
pub fn match_catalog(url: &str, catalog: &Catalog) -> ResolutionResult {
    catalog
        .providers()
        .find(|provider| provider.claims(url))
        .map(|provider| ResolutionResult::Matched(provider.identifier.clone()))
        .unwrap_or(ResolutionResult::NoMatch)
}

/// Resolves `url` to a provider identifier. URLs nobody claims go to the
/// generic handler, so this never returns [`ResolutionResult::NoMatch`].
pub fn resolve_provider(url: &str, catalog: &Catalog) -> ResolutionResult {
    let resolved = match match_catalog(url, catalog) {
        ResolutionResult::NoMatch => ResolutionResult::Matched(catalog.generic.identifier.clone()),
        matched => matched,
    };
    tracing::debug!(url, provider = ?resolved.identifier(), "resolved embed provider");
    resolved
}

/// Whether a handler running as `active` should hand `url` over to `resolved`.
///
/// Never switches to the generic fallback: both the generic and the WordPress
/// handler lack patterns, so switching would resolve back to the fallback
/// forever. The WordPress handler itself never switches away either.
pub fn should_switch_provider(active: &str, resolved: &ResolutionResult) -> bool {
    match resolved {
        ResolutionResult::NoMatch => false,
        ResolutionResult::Matched(identifier) => {
            active != WORDPRESS_PROVIDER
                && identifier != GENERIC_PROVIDER
                && identifier != active
        }
    }
}

/// The provider `url` should be handled by when it was submitted to `active`,
/// or `None` if `active` should keep it.
pub fn redispatch_target(url: &str, active: &str, catalog: &Catalog) -> Option<SmolStr> {
    if catalog.get(active).is_some_and(|provider| provider.claims(url)) {
        return None;
    }
    let resolved = resolve_provider(url, catalog);
    if should_switch_provider(active, &resolved) {
        resolved.identifier().map(SmolStr::new)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(identifier: &str, patterns: &[&str]) -> ProviderSpec {
        ProviderSpec {
            identifier: SmolStr::new(identifier),
            title: SmolStr::new(identifier),
            icon: ProviderIcon::Post,
            keywords: Vec::new(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                spec("first", &[r"^https?://(www\.)?example\.com/a/.+"]),
                spec("second", &[r"^https?://(www\.)?example\.com/.+"]),
                spec("empty", &[]),
            ],
            vec![spec("other", &[r"^https?://(www\.)?example\.com/.+", r"exam\.pl/.+"])],
        )
        .unwrap()
    }

    #[test]
    fn test_first_match_within_tier_wins() {
        let catalog = catalog();
        assert_eq!(
            resolve_provider("https://example.com/a/1", &catalog),
            ResolutionResult::Matched("first".into())
        );
        assert_eq!(
            resolve_provider("https://example.com/b/1", &catalog),
            ResolutionResult::Matched("second".into())
        );
    }

    #[test]
    fn test_common_tier_beats_other_tier() {
        let catalog = catalog();
        assert_eq!(
            match_catalog("https://www.example.com/c", &catalog).identifier(),
            Some("second")
        );
        assert_eq!(
            match_catalog("http://exam.pl/x", &catalog).identifier(),
            Some("other")
        );
    }

    #[test]
    fn test_unmatched_url_falls_back_to_generic() {
        let catalog = catalog();
        assert_eq!(
            match_catalog("ftp://example.com/file", &catalog),
            ResolutionResult::NoMatch
        );
        assert_eq!(
            resolve_provider("ftp://example.com/file", &catalog),
            ResolutionResult::Matched(GENERIC_PROVIDER.into())
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(
            resolve_provider("HTTPS://EXAMPLE.COM/A/1", &catalog).identifier(),
            Some("first")
        );
    }

    #[test]
    fn test_provider_without_patterns_never_matches() {
        let catalog = catalog();
        let empty = catalog.get("empty").unwrap();
        assert!(!empty.claims("https://example.com/a/1"));
        assert!(!empty.claims(""));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = catalog();
        let url = "https://example.com/a/zzz";
        let first = resolve_provider(url, &catalog);
        for _ in 0..10 {
            assert_eq!(resolve_provider(url, &catalog), first);
        }
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let err = Catalog::new(vec![spec("dup", &[])], vec![spec("dup", &[])]).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(id) if id == "dup"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Catalog::new(vec![spec("bad", &["(unclosed"])], vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::Pattern { identifier, .. } if identifier == "bad"));
    }

    #[test]
    fn test_unanchored_pattern_matches_anywhere_in_url() {
        // patterns are searched, not anchored: custom catalogs must add `^`
        // themselves to keep look-alike hosts out
        let loose = Catalog::new(vec![spec("loose", &[r"(www\.)?youtube\.com/.+"])], vec![])
            .unwrap();
        assert_eq!(
            resolve_provider("https://fakeyoutube.com/x", &loose).identifier(),
            Some("loose")
        );

        let anchored = Catalog::new(
            vec![spec("anchored", &[r"^https?://(www\.)?youtube\.com/.+"])],
            vec![],
        )
        .unwrap();
        assert_eq!(
            resolve_provider("https://fakeyoutube.com/x", &anchored).identifier(),
            Some(GENERIC_PROVIDER)
        );
        assert_eq!(
            resolve_provider("https://www.youtube.com/x", &anchored).identifier(),
            Some("anchored")
        );
    }

    #[test]
    fn test_no_switch_to_generic_fallback() {
        let fallback = ResolutionResult::Matched(GENERIC_PROVIDER.into());
        assert!(!should_switch_provider(WORDPRESS_PROVIDER, &fallback));
        assert!(!should_switch_provider(GENERIC_PROVIDER, &fallback));
        assert!(!should_switch_provider("first", &fallback));
    }

    #[test]
    fn test_switch_rules() {
        let second = ResolutionResult::Matched("second".into());
        assert!(should_switch_provider(GENERIC_PROVIDER, &second));
        assert!(should_switch_provider("first", &second));
        assert!(!should_switch_provider("second", &second));
        assert!(!should_switch_provider(WORDPRESS_PROVIDER, &second));
        assert!(!should_switch_provider("first", &ResolutionResult::NoMatch));
    }

    #[test]
    fn test_redispatch_keeps_claiming_provider() {
        let catalog = catalog();
        // "second" also claims /a/ URLs, so it keeps them even though "first" sorts earlier
        assert_eq!(redispatch_target("https://example.com/a/1", "second", &catalog), None);
        assert_eq!(
            redispatch_target("https://example.com/a/1", GENERIC_PROVIDER, &catalog),
            Some("first".into())
        );
        assert_eq!(redispatch_target("https://nowhere.test/", "first", &catalog), None);
    }
}
