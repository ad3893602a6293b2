//! Authorization policy.
//!
//! Every handler asks the same questions through [`Policy`]; nothing outside
//! this module compares owner ids or inspects staff flags directly.

use crate::database::models::{Chat, Message, User};
use crate::error::ApiError;

/// Anything with a single owning user
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Chat {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Message {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// The authenticated principal of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

impl Actor {
    /// Admin-only routes and unscoped listings
    pub fn is_admin(&self) -> bool {
        self.is_staff
    }

    /// Owner filter for list endpoints; staff see everything
    pub fn list_scope(&self) -> Option<i64> {
        if self.is_admin() {
            None
        } else {
            Some(self.id)
        }
    }

    /// Route gate checked before any object lookup
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::debug!("Actor {} denied admin-only route", self.id);
            Err(ApiError::forbidden("You do not have permission to perform this action."))
        }
    }
}

/// Object-level permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The owner, a superuser, or a staff member
    OwnerOrAdmin,
    /// The owner only, no staff override
    Owner,
}

impl Policy {
    pub fn allows(self, actor: &Actor, resource: &impl Owned) -> bool {
        let is_owner = resource.owner_id() == actor.id;
        match self {
            Policy::OwnerOrAdmin => is_owner || actor.is_superuser || actor.is_staff,
            Policy::Owner => is_owner,
        }
    }

    pub fn enforce(self, actor: &Actor, resource: &impl Owned) -> Result<(), ApiError> {
        if self.allows(actor, resource) {
            return Ok(());
        }
        tracing::debug!(
            "Actor {} denied {:?} on resource owned by {}",
            actor.id,
            self,
            resource.owner_id()
        );
        Err(ApiError::forbidden("You do not have permission to perform this action."))
    }
}
