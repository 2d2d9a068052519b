//! Create activity processor.

use plaza_common::{AppResult, IdGenerator};
use plaza_store::entities::{note, note_attachment, note_tag};
use plaza_store::repositories::{NoteAttachmentRepository, NoteRepository, NoteTagRepository, PollRepository};
use sea_orm::Set;
use tracing::{info, warn};

use crate::activities::CreateActivity;
use crate::objects::{ApAttachment, ApNote, ApTag};
use crate::resolver::Resolver;

/// Processor for Create activities (notes and polls).
#[derive(Clone)]
pub struct CreateProcessor {
    note_repo: NoteRepository,
    attachment_repo: NoteAttachmentRepository,
    tag_repo: NoteTagRepository,
    poll_repo: PollRepository,
    resolver: Resolver,
    id_gen: IdGenerator,
}

impl CreateProcessor {
    /// Create a new create processor.
    #[must_use]
    pub fn new(
        note_repo: NoteRepository,
        attachment_repo: NoteAttachmentRepository,
        tag_repo: NoteTagRepository,
        poll_repo: PollRepository,
        resolver: Resolver,
    ) -> Self {
        Self { note_repo, attachment_repo, tag_repo, poll_repo, resolver, id_gen: IdGenerator::new() }
    }

    /// Process an incoming Create activity (Note or Question).
    pub async fn process(&self, activity: &CreateActivity) -> AppResult<note::Model> {
        info!(actor = %activity.actor, object = %activity.object.id, "processing Create activity");

        if let Some(existing) = self.note_repo.find_by_uri(activity.object.id.as_str()).await? {
            info!(note_id = %existing.id, "note already exists");
            return Ok(existing);
        }

        let author = self
            .resolver
            .resolve(activity.actor.as_str())
            .await
            .map_err(|e| plaza_common::AppError::Federation(format!("resolving note author {}: {e}", activity.actor)))?;

        let note = self.create_note_from_ap(&activity.object, &author.id).await?;

        self.create_tags(&note.id, activity.object.tag.as_deref().unwrap_or(&[])).await;
        self.create_attachments(&note.id, activity.object.attachment.as_deref().unwrap_or(&[])).await;

        if activity.object.is_question() {
            self.create_poll(&note.id, &activity.object).await;
        }

        info!(note_id = %note.id, author = %author.id, "created note from remote");

        Ok(note)
    }

    async fn create_note_from_ap(&self, ap_note: &ApNote, author_id: &str) -> AppResult<note::Model> {
        let reply_root_id = if let Some(ref reply_url) = ap_note.in_reply_to {
            match self.note_repo.find_by_uri(reply_url.as_str()).await? {
                Some(reply_note) => Some(reply_note.reply_root_id.unwrap_or(reply_note.id)),
                None => None,
            }
        } else {
            None
        };

        let in_reply_to_id = if let Some(ref reply_url) = ap_note.in_reply_to {
            self.note_repo.find_by_uri(reply_url.as_str()).await?.map(|n| n.id)
        } else {
            None
        };

        let quote_id = if let Some(quote_url) = ap_note.get_quote_url() {
            self.note_repo.find_by_uri(quote_url.as_str()).await?.map(|n| n.id)
        } else {
            None
        };

        let visibility = determine_visibility(ap_note);
        let (to, cc) = (
            ap_note.to.clone().unwrap_or_default().iter().map(ToString::to_string).collect::<Vec<_>>(),
            ap_note.cc.clone().unwrap_or_default().iter().map(ToString::to_string).collect::<Vec<_>>(),
        );

        let note_id = self.id_gen.generate();

        let model = note::ActiveModel {
            id: Set(note_id.clone()),
            actor_id: Set(author_id.to_string()),
            uri: Set(Some(ap_note.id.to_string())),
            content: Set(Some(strip_html_basic(&ap_note.content))),
            visibility: Set(visibility),
            to: Set(serde_json::json!(to)),
            cc: Set(serde_json::json!(cc)),
            in_reply_to_id: Set(in_reply_to_id),
            reply_root_id: Set(reply_root_id.or_else(|| Some(note_id.clone()))),
            quote_id: Set(quote_id),
            group_id: Set(None),
            published_at: Set(ap_note.published.into()),
            edited_at: Set(None),
            deleted: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.note_repo.create(model).await
    }

    async fn create_tags(&self, note_id: &str, tags: &[ApTag]) {
        for tag in tags {
            let (kind, value) = match tag.kind.as_str() {
                "Mention" => {
                    let Some(ref href) = tag.href else { continue };
                    (note_tag::TagKind::Mention, href.to_string())
                }
                "Hashtag" => {
                    let Some(name) = tag.name.as_deref() else { continue };
                    (note_tag::TagKind::Hashtag, name.trim_start_matches('#').to_lowercase())
                }
                _ => continue,
            };

            let model = note_tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                note_id: Set(note_id.to_string()),
                kind: Set(kind),
                value: Set(value),
            };

            if let Err(e) = self.tag_repo.create(model).await {
                warn!(note_id, error = %e, "failed to record tag");
            }
        }
    }

    async fn create_attachments(&self, note_id: &str, attachments: &[ApAttachment]) {
        for attachment in attachments {
            if attachment.kind != "Document" {
                continue;
            }

            let model = note_attachment::ActiveModel {
                id: Set(self.id_gen.generate()),
                note_id: Set(note_id.to_string()),
                url: Set(attachment.url.to_string()),
                media_type: Set(attachment.media_type.clone()),
                name: Set(attachment.name.clone()),
                width: Set(attachment.width.map(|w| w as i32)),
                height: Set(attachment.height.map(|h| h as i32)),
                blurhash: Set(attachment.blurhash.clone()),
                created_at: Set(chrono::Utc::now().into()),
            };

            if let Err(e) = self.attachment_repo.create(model).await {
                warn!(note_id, url = %attachment.url, error = %e, "failed to record attachment");
            }
        }
    }

    async fn create_poll(&self, note_id: &str, ap_note: &ApNote) {
        let (options, multiple) = match (&ap_note.one_of, &ap_note.any_of) {
            (Some(opts), _) => (opts, false),
            (None, Some(opts)) => (opts, true),
            (None, None) => return,
        };

        let labels: Vec<String> = options.iter().map(|o| o.name.clone()).collect();
        let votes: Vec<i64> =
            options.iter().map(|o| i64::from(o.replies.as_ref().map_or(0, |r| r.total_items))).collect();

        let model = plaza_store::entities::poll::ActiveModel {
            note_id: Set(note_id.to_string()),
            options: Set(serde_json::json!(labels)),
            votes: Set(serde_json::json!(votes)),
            multiple: Set(multiple),
            expires_at: Set(ap_note.end_time.map(Into::into).unwrap_or_else(|| {
                (chrono::Utc::now() + chrono::Duration::days(365)).into()
            })),
            closed: Set(ap_note.closed.is_some()),
        };

        if let Err(e) = self.poll_repo.create(model).await {
            warn!(note_id, error = %e, "failed to record poll");
        }
    }
}

/// Determine visibility from `ActivityPub` addressing.
fn determine_visibility(ap_note: &ApNote) -> note::Visibility {
    let public = "https://www.w3.org/ns/activitystreams#Public";

    let to_urls = ap_note.to.as_deref().unwrap_or(&[]);
    let cc_urls = ap_note.cc.as_deref().unwrap_or(&[]);

    let is_public = to_urls.iter().any(|u| u.as_str() == public) || cc_urls.iter().any(|u| u.as_str() == public);

    if is_public {
        note::Visibility::Public
    } else if to_urls.is_empty() && cc_urls.is_empty() {
        note::Visibility::Direct
    } else {
        note::Visibility::Followers
    }
}

/// Basic HTML stripping, for converting `ActivityPub` content to plain text.
fn strip_html_basic(html: &str) -> String {
    let html = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p><p>", "\n\n")
        .replace("</p>", "\n")
        .replace("<p>", "");

    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_basic_handles_tags_and_entities() {
        assert_eq!(strip_html_basic("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html_basic("<a href='x'>Link</a>"), "Link");
        assert_eq!(strip_html_basic("a &amp; b"), "a & b");
        assert_eq!(strip_html_basic("line1<br>line2"), "line1\nline2");
    }

    #[test]
    fn visibility_follows_addressing() {
        let public = "https://www.w3.org/ns/activitystreams#Public".parse().unwrap();
        let follower = "https://example.com/followers/alice".parse().unwrap();
        let direct = "https://example.com/user/bob".parse().unwrap();

        let mut note = ApNote::new(
            "https://example.com/post/1".parse().unwrap(),
            "https://example.com/user/alice".parse().unwrap(),
            "hi".to_string(),
            chrono::Utc::now(),
        );

        note.to = Some(vec![public]);
        assert!(matches!(determine_visibility(&note), note::Visibility::Public));

        note.to = Some(vec![follower]);
        assert!(matches!(determine_visibility(&note), note::Visibility::Followers));

        note.to = Some(vec![direct]);
        note.cc = None;
        assert!(matches!(determine_visibility(&note), note::Visibility::Followers));

        note.to = None;
        note.cc = None;
        assert!(matches!(determine_visibility(&note), note::Visibility::Direct));
    }
}
