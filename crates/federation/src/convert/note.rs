//! Note <-> `ApNote` conversion.

use chrono::Utc;
use plaza_store::entities::{note, note_attachment, note_tag};
use url::Url;

use crate::objects::{ApAttachment, ApNote, ApObjectType, ApTag};

use super::user::UrlConfig;

/// Extension trait for converting a note row to `ApNote`.
pub trait NoteToApNote {
    /// Convert to `ApNote`. `tags` and `attachments` must belong to this note.
    fn to_ap_note(
        &self,
        config: &UrlConfig,
        author_name: &str,
        tags: &[note_tag::Model],
        attachments: &[note_attachment::Model],
    ) -> ApNote;
}

impl NoteToApNote for note::Model {
    fn to_ap_note(
        &self,
        config: &UrlConfig,
        author_name: &str,
        tags: &[note_tag::Model],
        attachments: &[note_attachment::Model],
    ) -> ApNote {
        let id = self.uri.as_deref().and_then(|u| Url::parse(u).ok()).unwrap_or_else(|| note_url(config, &self.id));

        let attributed_to = config.user_url(author_name);
        let content = self.content.clone().unwrap_or_default();
        let published = self.published_at.with_timezone(&Utc);

        let ap_tags: Vec<ApTag> = tags
            .iter()
            .map(|tag| match tag.kind {
                note_tag::TagKind::Mention => ApTag {
                    kind: "Mention".to_string(),
                    href: Url::parse(&tag.value).ok(),
                    name: Some(format!("@{}", tag.value)),
                },
                note_tag::TagKind::Hashtag => ApTag {
                    kind: "Hashtag".to_string(),
                    href: None,
                    name: Some(format!("#{}", tag.value)),
                },
            })
            .collect();

        let ap_attachments: Vec<ApAttachment> = attachments
            .iter()
            .filter_map(|a| {
                Url::parse(&a.url).ok().map(|url| ApAttachment {
                    kind: "Document".to_string(),
                    url,
                    media_type: a.media_type.clone(),
                    name: a.name.clone(),
                    width: a.width.and_then(|w| u32::try_from(w).ok()),
                    height: a.height.and_then(|h| u32::try_from(h).ok()),
                    blurhash: a.blurhash.clone(),
                })
            })
            .collect();

        let (to, cc) = visibility_to_addressing(&self.visibility, config, author_name);

        let in_reply_to = self.in_reply_to_id.as_ref().map(|reply_id| note_url(config, reply_id));
        let quote_url = self.quote_id.as_ref().map(|quote_id| note_url(config, quote_id));

        ApNote {
            kind: ApObjectType::Note,
            id,
            attributed_to,
            content,
            published,
            to,
            cc,
            in_reply_to,
            summary: None,
            sensitive: None,
            tag: if ap_tags.is_empty() { None } else { Some(ap_tags) },
            attachment: if ap_attachments.is_empty() { None } else { Some(ap_attachments) },
            one_of: None,
            any_of: None,
            end_time: None,
            closed: None,
            voters_count: None,
            quote_url,
            quote_uri: None,
        }
    }
}

/// Generate note URL.
fn note_url(config: &UrlConfig, note_id: &str) -> Url {
    config.base_url.join(&format!("/post/{note_id}")).expect("valid URL")
}

/// Convert visibility to AP addressing.
fn visibility_to_addressing(
    visibility: &note::Visibility,
    config: &UrlConfig,
    author_name: &str,
) -> (Option<Vec<Url>>, Option<Vec<Url>>) {
    let public = Url::parse("https://www.w3.org/ns/activitystreams#Public").unwrap();
    let followers = config.followers_url(author_name);

    match visibility {
        note::Visibility::Public => (Some(vec![public]), Some(vec![followers])),
        note::Visibility::Followers => (Some(vec![followers]), None),
        note::Visibility::Direct => (None, None),
    }
}

/// Extension trait for `ApNote`.
pub trait ApNoteExt {
    /// Check if this note is public.
    fn is_public(&self) -> bool;

    /// Extract the host from the note ID.
    fn extract_host(&self) -> Option<String>;
}

impl ApNoteExt for ApNote {
    fn is_public(&self) -> bool {
        let public = "https://www.w3.org/ns/activitystreams#Public";
        self.to.as_ref().is_some_and(|to| to.iter().any(|u| u.as_str() == public))
            || self.cc.as_ref().is_some_and(|cc| cc.iter().any(|u| u.as_str() == public))
    }

    fn extract_host(&self) -> Option<String> {
        self.id.host_str().map(std::string::ToString::to_string)
    }
}
