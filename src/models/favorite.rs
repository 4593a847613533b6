use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's bookmark of a snippet, possibly someone else's.
///
/// `snippet_id` is a weak reference. The snippet can be deleted while the
/// favorite survives; consumers resolve favorites against their snippet
/// mirror and skip the ones that do not (or do not yet) resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub owner_id: String,
    pub snippet_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(owner_id: &str, snippet_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            snippet_id,
            created_at: Utc::now(),
        }
    }
}
