//! Markup for embeds as they are saved into a post and wrapped in the editor.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::classify::EmbedKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedAlign {
    Left,
    Center,
    Right,
    Wide,
    Full,
}

impl EmbedAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Wide => "wide",
            Self::Full => "full",
        }
    }
}

/// `data-align` value for the editor wrapper. Centered embeds don't get one.
pub fn edit_wrapper_align(align: Option<EmbedAlign>) -> Option<&'static str> {
    match align? {
        EmbedAlign::Center => None,
        other => Some(other.as_str()),
    }
}

/// Class list of a saved embed figure.
pub fn embed_class_names(
    align: Option<EmbedAlign>,
    kind: Option<EmbedKind>,
    provider_slug: Option<&str>,
) -> String {
    let mut classes = String::from("wp-block-embed");
    if let Some(align) = align {
        let _ = write!(classes, " is-align{}", align.as_str());
    }
    if let Some(kind) = kind {
        let _ = write!(classes, " is-type-{}", kind.as_str());
    }
    if let Some(slug) = provider_slug.filter(|s| !s.is_empty()) {
        let _ = write!(classes, " is-provider-{slug}");
    }
    classes
}

/// Class list of the live preview figure in the editor.
pub fn preview_class_names(kind: EmbedKind) -> &'static str {
    match kind {
        EmbedKind::Video => "wp-block-embed is-video",
        _ => "wp-block-embed",
    }
}

/// Saved fields of an embed block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEmbed {
    pub url: String,
    /// Caption markup, already rendered by the rich text field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<EmbedAlign>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EmbedKind>,
    #[serde(
        rename = "providerNameSlug",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_slug: Option<String>,
}

impl SavedEmbed {
    /// Figure markup stored in the post. The URL sits on its own line so the
    /// server-side embed filter can pick it up. Nothing is saved without a URL.
    pub fn to_markup(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return None;
        }
        let classes = embed_class_names(self.align, self.kind, self.provider_slug.as_deref());
        let mut out = format!(
            "<figure class=\"{}\">\n{}\n",
            escape_attr(&classes),
            escape_text(&self.url)
        );
        if let Some(caption) = self.caption.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(out, "<figcaption>{caption}</figcaption>");
        }
        out.push_str("</figure>");
        Some(out)
    }
}

pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        assert_eq!(embed_class_names(None, None, None), "wp-block-embed");
        insta::assert_snapshot!(
            embed_class_names(Some(EmbedAlign::Wide), Some(EmbedKind::Video), Some("you-tube")),
            @"wp-block-embed is-alignwide is-type-video is-provider-you-tube"
        );
        assert_eq!(
            embed_class_names(None, Some(EmbedKind::WordPressEmbed), Some("")),
            "wp-block-embed is-type-wp-embed"
        );
    }

    #[test]
    fn test_edit_wrapper_align() {
        assert_eq!(edit_wrapper_align(None), None);
        assert_eq!(edit_wrapper_align(Some(EmbedAlign::Center)), None);
        assert_eq!(edit_wrapper_align(Some(EmbedAlign::Left)), Some("left"));
        assert_eq!(edit_wrapper_align(Some(EmbedAlign::Full)), Some("full"));
    }

    #[test]
    fn test_preview_class_names() {
        assert_eq!(preview_class_names(EmbedKind::Video), "wp-block-embed is-video");
        assert_eq!(preview_class_names(EmbedKind::Rich), "wp-block-embed");
    }

    #[test]
    fn test_saved_markup() {
        let saved = SavedEmbed {
            url: "https://youtu.be/abc?a=1&b=2".into(),
            caption: Some("A <em>video</em>".into()),
            align: Some(EmbedAlign::Right),
            kind: Some(EmbedKind::Video),
            provider_slug: Some("you-tube".into()),
        };
        assert_eq!(
            saved.to_markup().unwrap(),
            "<figure class=\"wp-block-embed is-alignright is-type-video is-provider-you-tube\">\n\
             https://youtu.be/abc?a=1&amp;b=2\n\
             <figcaption>A <em>video</em></figcaption></figure>"
        );
    }

    #[test]
    fn test_saved_markup_requires_url() {
        assert_eq!(SavedEmbed::default().to_markup(), None);
        let bare = SavedEmbed {
            url: "https://example.com/x".into(),
            ..Default::default()
        };
        assert_eq!(
            bare.to_markup().unwrap(),
            "<figure class=\"wp-block-embed\">\nhttps://example.com/x\n</figure>"
        );
    }

    #[test]
    fn test_saved_embed_attributes_roundtrip_names() {
        let saved: SavedEmbed = serde_json::from_str(
            r#"{"url":"https://x.test/1","type":"wp-embed","providerNameSlug":"word-press","align":"full"}"#,
        )
        .unwrap();
        assert_eq!(saved.kind, Some(EmbedKind::WordPressEmbed));
        assert_eq!(saved.align, Some(EmbedAlign::Full));
        assert_eq!(saved.provider_slug.as_deref(), Some("word-press"));
    }
}
