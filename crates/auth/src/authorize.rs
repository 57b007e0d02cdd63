//! Permission check gate used by request-authorization middleware.
//!
//! No caching happens here; a caller that caches results must drop them when
//! the user's overrides or any of their roles' permissions change.

use serde::Serialize;
use thiserror::Error;

use rolegate_core::{DomainError, DomainResult, RoleId, UserId};

use crate::context::RbacContext;
use crate::overrides::OverrideKind;
use crate::resolver::{effective_from, gather, resolve};
use crate::PermissionKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error(transparent)]
    Resolution(#[from] DomainError),
}

/// Operation-side authorization contract.
///
/// Implement this on operations that require permissions; the calling layer
/// checks them with [`authorize_operation`] before running the operation.
pub trait RequiresPermissions {
    fn required_permissions(&self) -> &[PermissionKey];
}

/// Whether `user_id` effectively holds `permission_key`.
pub fn has_permission(ctx: &RbacContext, user_id: UserId, permission_key: &str) -> DomainResult<bool> {
    Ok(resolve(ctx, user_id)?.contains(permission_key))
}

/// Require a single permission.
pub fn authorize(ctx: &RbacContext, user_id: UserId, required: &str) -> Result<(), AuthzError> {
    if has_permission(ctx, user_id, required)? {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.to_string()))
    }
}

/// Require every permission an operation declares, resolving once.
pub fn authorize_operation<O: RequiresPermissions + ?Sized>(
    ctx: &RbacContext,
    user_id: UserId,
    operation: &O,
) -> Result<(), AuthzError> {
    let effective = resolve(ctx, user_id)?;
    for required in operation.required_permissions() {
        if !effective.contains(required.as_str()) {
            return Err(AuthzError::Forbidden(required.to_string()));
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Where a decision came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionSource {
    /// Carried by one or more assigned roles.
    Roles { role_ids: Vec<RoleId> },
    /// Held only because of a GRANT override.
    GrantOverride,
    /// Removed by a DENY override; `role_ids` lists roles that would have
    /// granted it.
    DenyOverride { role_ids: Vec<RoleId> },
    /// Neither a role nor an override provides it.
    Absent,
}

/// Detailed explanation of one authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub user_id: UserId,
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub source: DecisionSource,
    pub roles: Vec<RoleId>,
    /// Sorted.
    pub effective_permissions: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Explain why `user_id` does or does not hold `required`.
pub fn explain_authorization(
    ctx: &RbacContext,
    user_id: UserId,
    required: &str,
) -> DomainResult<AuthorizationExplanation> {
    let inputs = gather(ctx, user_id)?;

    let granting_roles: Vec<RoleId> = inputs
        .role_permissions
        .iter()
        .filter(|(_, keys)| keys.contains(required))
        .map(|(role_id, _)| *role_id)
        .collect();
    let override_kind = inputs.override_for(required);

    let effective = effective_from(user_id, inputs);
    let granted = effective.contains(required);

    let source = match (override_kind, granting_roles.is_empty()) {
        (Some(OverrideKind::Deny), _) => DecisionSource::DenyOverride {
            role_ids: granting_roles.clone(),
        },
        (_, false) => DecisionSource::Roles {
            role_ids: granting_roles.clone(),
        },
        (Some(OverrideKind::Grant), true) => DecisionSource::GrantOverride,
        (None, true) => DecisionSource::Absent,
    };

    let reason = match &source {
        DecisionSource::Roles { role_ids } => format!(
            "Permission '{required}' is granted by {} assigned role(s)",
            role_ids.len()
        ),
        DecisionSource::GrantOverride => {
            format!("Permission '{required}' is granted by a user override")
        }
        DecisionSource::DenyOverride { .. } => {
            format!("Permission '{required}' is denied by a user override")
        }
        DecisionSource::Absent => {
            format!("No assigned role or override provides permission '{required}'")
        }
    };

    let suggestions = match &source {
        DecisionSource::DenyOverride { .. } => vec![format!(
            "Remove the DENY override for '{required}' or replace it with a GRANT"
        )],
        DecisionSource::Absent => vec![
            format!("Assign a role that carries the '{required}' permission"),
            format!("Add a GRANT override for '{required}'"),
        ],
        _ => Vec::new(),
    };

    Ok(AuthorizationExplanation {
        user_id,
        required_permission: required.to_string(),
        granted,
        reason,
        source,
        roles: effective.roles.iter().copied().collect(),
        effective_permissions: effective.iter().map(|p| p.as_str().to_string()).collect(),
        suggestions,
    })
}
