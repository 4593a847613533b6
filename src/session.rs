use uuid::Uuid;

/// Identity of the signed-in user plus a transient id for this client
/// session. The authentication flow itself lives outside this crate; it
/// hands us an opaque user id.
///
/// The session id scopes best-effort view deduplication: two sessions of the
/// same user count as distinct viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub session_id: Uuid,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: Uuid::new_v4(),
        }
    }
}
