//! Conversation session identity.
//!
//! One identifier per widget instance, generated lazily and replaced once the
//! backend hands back a canonical id.

use std::sync::Mutex;

use chrono::Utc;
use rand::TryRngCore;
use uuid::Uuid;

use crate::lock_or_recover;

/// Produces and holds the session identifier sent with every chat message.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: Mutex<Option<String>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the active identifier, generating one on first use.
    pub fn get_or_create(&self) -> String {
        let mut current = lock_or_recover(&self.current);
        current.get_or_insert_with(generate_session_id).clone()
    }

    /// Replace the local identifier with the one assigned by the server.
    ///
    /// Blank ids are ignored so a misbehaving backend cannot clear the session.
    pub fn adopt_server_id(&self, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        let mut current = lock_or_recover(&self.current);
        if current.as_deref() != Some(id) {
            tracing::debug!(session_id = %id, "Adopted server session id");
            *current = Some(id.to_string());
        }
    }

    /// The identifier if one has been generated or adopted.
    pub fn peek(&self) -> Option<String> {
        lock_or_recover(&self.current).clone()
    }
}

/// Random v4 UUID from the OS entropy source, or a time-plus-random
/// composite when the OS source is unavailable.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    match rand::rngs::OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "OS random source unavailable; using fallback session id");
            fallback_session_id()
        }
    }
}

fn fallback_session_id() -> String {
    format!(
        "sess_{}_{}",
        Utc::now().timestamp_millis(),
        rand::random_range(0..1_000_000u32)
    )
}

/// Whether `id` parses as a UUID. Server ids need not, local ones normally do.
pub fn is_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

// =============================================================================
// Tests
// =============================================================================
