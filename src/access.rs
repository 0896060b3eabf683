//! Ownership/authorization collaborator. The lifecycle only asks for a yes/no decision.

use crate::types::{PositionId, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

/// Caller identity as resolved by the surrounding auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub tenant_id: TenantId,
}

impl Actor {
    pub fn new(user_id: Uuid, tenant_id: TenantId) -> Self {
        Self { user_id, tenant_id }
    }

    /// Actor for local single-tenant use (CLI).
    pub fn local() -> Self {
        Self {
            user_id: Uuid::nil(),
            tenant_id: TenantId(Uuid::nil()),
        }
    }
}

pub trait AccessPolicy: Send + Sync {
    fn is_permitted(&self, actor: &Actor, action: Action, position_id: PositionId) -> bool;
}

/// Permits everything. Local CLI use only.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermitAll;

impl AccessPolicy for PermitAll {
    fn is_permitted(&self, _actor: &Actor, _action: Action, _position_id: PositionId) -> bool {
        true
    }
}

/// Positions belong to tenants; actors may act on positions of their own tenant.
/// Unknown positions are denied.
#[derive(Debug, Default)]
pub struct TenantAccessPolicy {
    owners: RwLock<HashMap<PositionId, TenantId>>,
}

impl TenantAccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, position_id: PositionId, tenant_id: TenantId) {
        if let Ok(mut owners) = self.owners.write() {
            owners.insert(position_id, tenant_id);
        }
    }

    pub fn owner_of(&self, position_id: PositionId) -> Option<TenantId> {
        self.owners.read().ok()?.get(&position_id).copied()
    }
}

impl AccessPolicy for TenantAccessPolicy {
    fn is_permitted(&self, actor: &Actor, _action: Action, position_id: PositionId) -> bool {
        self.owner_of(position_id) == Some(actor.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_policy_scopes_by_owner() {
        let policy = TenantAccessPolicy::new();
        let tenant = TenantId::new();
        let position = PositionId::new();
        policy.assign(position, tenant);

        let member = Actor::new(Uuid::new_v4(), tenant);
        let outsider = Actor::new(Uuid::new_v4(), TenantId::new());

        for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
            assert!(policy.is_permitted(&member, action, position));
            assert!(!policy.is_permitted(&outsider, action, position));
        }
    }

    #[test]
    fn unknown_position_denied() {
        let policy = TenantAccessPolicy::new();
        let actor = Actor::new(Uuid::new_v4(), TenantId::new());
        assert!(!policy.is_permitted(&actor, Action::Read, PositionId::new()));
    }

    #[test]
    fn permit_all_permits() {
        assert!(PermitAll.is_permitted(&Actor::local(), Action::Delete, PositionId::new()));
    }
}
