//! Role-based authorization policy.
//!
//! Every operation the domain exposes is named by an [`Operation`]; a single
//! lookup decides whether a [`Role`] may perform it. The check is pure and
//! runs before any store call.

use common::{Role, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// An already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn employee() -> Self {
        Self::new(UserId::new(), Role::Employee)
    }

    pub fn moderator() -> Self {
        Self::new(UserId::new(), Role::Moderator)
    }
}

/// The closed set of gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePickupPoint,
    ListPickupPoints,
    OpenReception,
    CloseReception,
    AddParcel,
    RemoveLastParcel,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::CreatePickupPoint,
        Operation::ListPickupPoints,
        Operation::OpenReception,
        Operation::CloseReception,
        Operation::AddParcel,
        Operation::RemoveLastParcel,
    ];

    /// Roles holding the capability for this operation.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::CreatePickupPoint => &[Role::Moderator],
            Operation::ListPickupPoints => &[Role::Moderator, Role::Employee],
            Operation::OpenReception
            | Operation::CloseReception
            | Operation::AddParcel
            | Operation::RemoveLastParcel => &[Role::Employee],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreatePickupPoint => "create pickup point",
            Operation::ListPickupPoints => "list pickup points",
            Operation::OpenReception => "open reception",
            Operation::CloseReception => "close reception",
            Operation::AddParcel => "add parcel",
            Operation::RemoveLastParcel => "remove last parcel",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `role` may perform `operation`.
pub fn is_allowed(role: Role, operation: Operation) -> bool {
    operation.allowed_roles().contains(&role)
}

/// Checks the caller against the policy for `operation`.
///
/// - No identity: `Unauthenticated`
/// - Identity without the capability: `Forbidden`
pub fn authorize(
    identity: Option<&Identity>,
    operation: Operation,
) -> Result<&Identity, DomainError> {
    let Some(identity) = identity else {
        tracing::warn!(%operation, "rejected unauthenticated request");
        metrics::counter!("operations_rejected_total", "kind" => "unauthenticated").increment(1);
        return Err(DomainError::Unauthenticated);
    };

    if !is_allowed(identity.role, operation) {
        tracing::warn!(
            %operation,
            role = %identity.role,
            user_id = %identity.user_id,
            "rejected request lacking capability"
        );
        metrics::counter!("operations_rejected_total", "kind" => "forbidden").increment(1);
        return Err(DomainError::Forbidden {
            role: identity.role,
            operation,
        });
    }

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn capability_matrix() {
        let expected = [
            (Operation::CreatePickupPoint, false, true),
            (Operation::ListPickupPoints, true, true),
            (Operation::OpenReception, true, false),
            (Operation::CloseReception, true, false),
            (Operation::AddParcel, true, false),
            (Operation::RemoveLastParcel, true, false),
        ];

        for (operation, employee, moderator) in expected {
            assert_eq!(is_allowed(Role::Employee, operation), employee, "{operation}");
            assert_eq!(is_allowed(Role::Moderator, operation), moderator, "{operation}");
        }
    }

    #[test]
    fn every_operation_is_allowed_to_someone() {
        for operation in Operation::ALL {
            assert!(!operation.allowed_roles().is_empty());
        }
    }

    #[test]
    fn missing_identity_is_unauthenticated() {
        for operation in Operation::ALL {
            let err = authorize(None, operation).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        }
    }

    #[test]
    fn disallowed_role_is_forbidden() {
        let employee = Identity::employee();
        let err = authorize(Some(&employee), Operation::CreatePickupPoint).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(
            err.to_string(),
            "Role 'employee' is not allowed to create pickup point"
        );
    }

    #[test]
    fn allowed_role_passes_identity_through() {
        let moderator = Identity::moderator();
        let granted = authorize(Some(&moderator), Operation::ListPickupPoints).unwrap();
        assert_eq!(granted, &moderator);
    }
}
