//! Session and identity bootstrap.

use memclaw_core::error::{Error, Result};
use memclaw_core::identity::{Identity, SessionId};
use memclaw_core::memory::{MemoryService, Session};
use tracing::{debug, info, warn};

/// Make sure the memory service knows the user and this run's session.
///
/// Each record is probed first and created only when the probe finds
/// nothing. A probe that fails outright is treated like "not found" and
/// a create is attempted anyway. Create failures are fatal.
pub async fn ensure_ready(
    memory: &dyn MemoryService,
    identity: &Identity,
    session_id: &SessionId,
) -> Result<Session> {
    let user_id = identity.user_id.as_str();

    let known_user = match memory.get_user(user_id).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            warn!(user_id, error = %e, "User lookup failed, will try to create");
            false
        }
    };
    if known_user {
        debug!(user_id, "User already exists");
    } else {
        memory
            .add_user(identity)
            .await
            .map_err(|e| Error::Bootstrap(format!("could not create user {user_id}: {e}")))?;
        info!(user_id, "Created user");
    }

    let existing = match memory.get_session(session_id.as_str()).await {
        Ok(found) => found,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Session lookup failed, will try to create");
            None
        }
    };
    if let Some(session) = existing {
        debug!(session_id = %session_id, "Session already exists");
        return Ok(session);
    }

    let session = memory
        .add_session(&Session {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
        })
        .await
        .map_err(|e| Error::Bootstrap(format!("could not create session {session_id}: {e}")))?;
    info!(session_id = %session.session_id, user_id, "Created session");
    Ok(session)
}
