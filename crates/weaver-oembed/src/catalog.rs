//! Built-in provider catalog and catalog files.
//!
//! Every built-in pattern is anchored at the scheme so that look-alike hosts
//! (`fakeyoutube.com`) are not claimed by the real provider.

use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::CatalogError;
use crate::provider::{Catalog, ProviderIcon, ProviderSpec, WORDPRESS_PROVIDER};

type BuiltinEntry = (
    &'static str,
    &'static str,
    ProviderIcon,
    &'static [&'static str],
    &'static [&'static str],
);

const COMMON: &[BuiltinEntry] = &[
    (
        "core-embed/twitter",
        "Twitter",
        ProviderIcon::Post,
        &["tweet"],
        &[r"^https?://(www\.)?twitter\.com/.+"],
    ),
    (
        "core-embed/youtube",
        "YouTube",
        ProviderIcon::Video,
        &["music", "video"],
        &[r"^https?://((m|www)\.)?youtube\.com/.+", r"^https?://youtu\.be/.+"],
    ),
    (
        "core-embed/facebook",
        "Facebook",
        ProviderIcon::Post,
        &[],
        &[r"^https?://www\.facebook\.com/.+"],
    ),
    (
        "core-embed/instagram",
        "Instagram",
        ProviderIcon::Photo,
        &["image"],
        &[r"^https?://(www\.)?instagr(\.am|am\.com)/.+"],
    ),
    (
        WORDPRESS_PROVIDER,
        "WordPress",
        ProviderIcon::Post,
        &["post", "blog"],
        &[],
    ),
    (
        "core-embed/soundcloud",
        "SoundCloud",
        ProviderIcon::Audio,
        &["music", "audio"],
        &[r"^https?://(www\.)?soundcloud\.com/.+"],
    ),
    (
        "core-embed/spotify",
        "Spotify",
        ProviderIcon::Audio,
        &["music", "audio"],
        &[r"^https?://(open|play)\.spotify\.com/.+"],
    ),
    (
        "core-embed/flickr",
        "Flickr",
        ProviderIcon::Photo,
        &["image"],
        &[r"^https?://(www\.)?flickr\.com/.+", r"^https?://flic\.kr/.+"],
    ),
    (
        "core-embed/vimeo",
        "Vimeo",
        ProviderIcon::Video,
        &["video"],
        &[r"^https?://(www\.)?vimeo\.com/.+"],
    ),
];

const OTHER: &[BuiltinEntry] = &[
    (
        "core-embed/animoto",
        "Animoto",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?(animoto|video214)\.com/.+"],
    ),
    (
        "core-embed/cloudup",
        "Cloudup",
        ProviderIcon::Post,
        &[],
        &[r"^https?://cloudup\.com/.+"],
    ),
    (
        "core-embed/collegehumor",
        "CollegeHumor",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?collegehumor\.com/.+"],
    ),
    (
        "core-embed/dailymotion",
        "Dailymotion",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?dailymotion\.com/.+"],
    ),
    (
        "core-embed/funnyordie",
        "Funny or Die",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?funnyordie\.com/.+"],
    ),
    (
        "core-embed/hulu",
        "Hulu",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?hulu\.com/.+"],
    ),
    (
        "core-embed/imgur",
        "Imgur",
        ProviderIcon::Photo,
        &[],
        &[r"^https?://(.+\.)?imgur\.com/.+"],
    ),
    (
        "core-embed/issuu",
        "Issuu",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?issuu\.com/.+"],
    ),
    (
        "core-embed/kickstarter",
        "Kickstarter",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?kickstarter\.com/.+", r"^https?://kck\.st/.+"],
    ),
    (
        "core-embed/meetup-com",
        "Meetup.com",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?meetu(\.ps|p\.com)/.+"],
    ),
    (
        "core-embed/mixcloud",
        "Mixcloud",
        ProviderIcon::Audio,
        &["music", "audio"],
        &[r"^https?://(www\.)?mixcloud\.com/.+"],
    ),
    (
        "core-embed/photobucket",
        "Photobucket",
        ProviderIcon::Photo,
        &[],
        &[r"^http://g?i*\.photobucket\.com/.+"],
    ),
    (
        "core-embed/polldaddy",
        "Polldaddy",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?polldaddy\.com/.+"],
    ),
    (
        "core-embed/reddit",
        "Reddit",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?reddit\.com/.+"],
    ),
    (
        "core-embed/reverbnation",
        "ReverbNation",
        ProviderIcon::Audio,
        &[],
        &[r"^https?://(www\.)?reverbnation\.com/.+"],
    ),
    (
        "core-embed/screencast",
        "Screencast",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.)?screencast\.com/.+"],
    ),
    (
        "core-embed/scribd",
        "Scribd",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?scribd\.com/.+"],
    ),
    (
        "core-embed/slideshare",
        "Slideshare",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(.+?\.)?slideshare\.net/.+"],
    ),
    (
        "core-embed/smugmug",
        "SmugMug",
        ProviderIcon::Photo,
        &[],
        &[r"^https?://(www\.)?smugmug\.com/.+"],
    ),
    (
        "core-embed/speaker",
        "Speaker",
        ProviderIcon::Audio,
        &[],
        &[r"^https?://(www\.)?speakerdeck\.com/.+"],
    ),
    (
        "core-embed/ted",
        "TED",
        ProviderIcon::Video,
        &[],
        &[r"^https?://(www\.|embed\.)?ted\.com/.+"],
    ),
    (
        "core-embed/tumblr",
        "Tumblr",
        ProviderIcon::Post,
        &[],
        &[r"^https?://(www\.)?tumblr\.com/.+"],
    ),
    (
        "core-embed/videopress",
        "VideoPress",
        ProviderIcon::Video,
        &["video"],
        &[r"^https?://videopress\.com/.+"],
    ),
    (
        "core-embed/wordpress-tv",
        "WordPress.tv",
        ProviderIcon::Video,
        &[],
        &[r"^https?://wordpress\.tv/.+"],
    ),
];

fn to_specs(entries: &[BuiltinEntry]) -> Vec<ProviderSpec> {
    entries
        .iter()
        .map(|(identifier, title, icon, keywords, patterns)| ProviderSpec {
            identifier: SmolStr::new_static(*identifier),
            title: SmolStr::new_static(*title),
            icon: *icon,
            keywords: keywords.iter().map(|k| SmolStr::new_static(*k)).collect(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        })
        .collect()
}

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    Catalog::new(to_specs(COMMON), to_specs(OTHER)).expect("built-in embed catalog is valid")
});

/// The catalog shipped with the crate.
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

/// On-disk catalog layout.
///
/// ```toml
/// [[common]]
/// identifier = "core-embed/youtube"
/// title = "YouTube"
/// icon = "embed-video"
/// patterns = ['^https?://((m|www)\.)?youtube\.com/.+']
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub common: Vec<ProviderSpec>,
    #[serde(default)]
    pub other: Vec<ProviderSpec>,
}

impl CatalogFile {
    pub fn into_catalog(self) -> Result<Catalog, CatalogError> {
        Catalog::new(self.common, self.other)
    }
}

impl From<&Catalog> for CatalogFile {
    fn from(catalog: &Catalog) -> Self {
        use crate::provider::Tier;

        let dump = |tier| {
            catalog
                .tier(tier)
                .iter()
                .map(|p| ProviderSpec {
                    identifier: SmolStr::new(p.identifier()),
                    title: SmolStr::new(p.title()),
                    icon: p.icon(),
                    keywords: p.keywords().to_vec(),
                    patterns: p.patterns().map(str::to_owned).collect(),
                })
                .collect()
        };
        Self {
            common: dump(Tier::Common),
            other: dump(Tier::Other),
        }
    }
}

pub fn parse_catalog(source: &str, path: &str) -> Result<Catalog, CatalogError> {
    let file: CatalogFile = toml::from_str(source).map_err(|source| CatalogError::Parse {
        path: path.to_owned(),
        source,
    })?;
    file.into_catalog()
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: shown.clone(),
        source,
    })?;
    let catalog = parse_catalog(&source, &shown)?;
    tracing::info!(path = %shown, providers = catalog.len(), "loaded embed catalog");
    Ok(catalog)
}
