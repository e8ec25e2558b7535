//! Collaborator profile
//!
//! Synced from the identity provider by the excluded CRUD layers; the engine
//! only needs the sector membership (for broadcast scoping) and the admin
//! flag.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user who owns and acts on activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: Uuid,
    pub name: String,
    pub sector_id: Uuid,
    pub is_admin: bool,
}
