//! Vote activity, casting a ballot in a poll.
//!
//! Not part of the core `ActivityPub` vocabulary; modeled the way Misskey
//! and Pleroma do it, as a `Note` of type `Vote` replying to the poll note,
//! `name` carrying the chosen option text.

use serde::{Deserialize, Serialize};
use url::Url;

/// The `type` value for a Vote activity.
pub const VOTE_TYPE: &str = "Vote";

/// Casts one ballot for an option on a poll note.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Url,
    pub actor: Url,
    /// The poll note being voted on.
    pub in_reply_to: Url,
    /// The chosen option text, matched positionally against the poll's
    /// option list.
    pub name: String,
}

impl VoteActivity {
    /// Create a new Vote activity.
    #[must_use]
    pub fn new(id: Url, actor: Url, in_reply_to: Url, name: String) -> Self {
        Self { kind: VOTE_TYPE.to_string(), id, actor, in_reply_to, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_vote_type() {
        let activity = VoteActivity::new(
            Url::parse("https://example.com/votes/1").unwrap(),
            Url::parse("https://example.com/user/alice").unwrap(),
            Url::parse("https://example.com/note/poll1").unwrap(),
            "Yes".to_string(),
        );
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "Vote");
        assert_eq!(json["name"], "Yes");
    }
}
