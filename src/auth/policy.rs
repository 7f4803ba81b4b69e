//! Authorization policy
//!
//! Pure decision function consulted before every directory mutation and
//! privileged read. Admins may do anything; regular accounts are limited
//! to the self-service operations on their own active record.

use crate::auth::Principal;
use crate::error::{inactive_account, AppError};

/// Directory operations subject to an authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    UpdateProfile,
    UpdatePassword,
    UpdateLogin,
    Delete,
    Restore,
    ListActive,
    GetByLogin,
    ListOlderThan,
}

impl Operation {
    /// Whether a non-admin may perform this on their own account
    fn allows_self_service(&self) -> bool {
        matches!(
            self,
            Operation::UpdateProfile | Operation::UpdatePassword | Operation::UpdateLogin
        )
    }
}

/// The record an operation is aimed at, as seen at decision time
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub login: &'a str,
    pub active: bool,
}

/// Decide whether `principal` may perform `op` against `target`.
///
/// `target` is `None` for operations without a resolved record
/// (CreateUser and the list reads). Self-service requires the target to
/// be the principal's own login and the account to be active; targeting
/// one's own revoked account surfaces as `InactiveAccount` rather than
/// `Forbidden`.
pub fn authorize(
    principal: &Principal,
    op: Operation,
    target: Option<Target<'_>>,
) -> Result<(), AppError> {
    if principal.role.is_admin() {
        return Ok(());
    }

    if !op.allows_self_service() {
        return Err(AppError::Forbidden(format!(
            "Operation requires the admin role, '{}' has role {}",
            principal.login, principal.role
        )));
    }

    match target {
        Some(t) if t.login == principal.login => {
            if t.active {
                Ok(())
            } else {
                Err(inactive_account(t.login))
            }
        }
        _ => Err(AppError::Forbidden(format!(
            "'{}' may only modify their own account",
            principal.login
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn admin() -> Principal {
        Principal::new("Admin", Role::Admin)
    }

    fn alice() -> Principal {
        Principal::new("alice", Role::User)
    }

    #[test]
    fn test_admin_allowed_everywhere() {
        let ops = [
            Operation::CreateUser,
            Operation::UpdateProfile,
            Operation::UpdatePassword,
            Operation::UpdateLogin,
            Operation::Delete,
            Operation::Restore,
            Operation::ListActive,
            Operation::GetByLogin,
            Operation::ListOlderThan,
        ];
        for op in ops {
            let target = Target { login: "bob", active: false };
            assert!(authorize(&admin(), op, Some(target)).is_ok(), "{:?}", op);
        }
    }

    #[test]
    fn test_user_may_update_own_active_account() {
        let target = Target { login: "alice", active: true };
        assert!(authorize(&alice(), Operation::UpdateProfile, Some(target)).is_ok());
        assert!(authorize(&alice(), Operation::UpdatePassword, Some(target)).is_ok());
        assert!(authorize(&alice(), Operation::UpdateLogin, Some(target)).is_ok());
    }

    #[test]
    fn test_user_denied_on_other_accounts() {
        let target = Target { login: "bob", active: true };
        let result = authorize(&alice(), Operation::UpdatePassword, Some(target));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_user_denied_on_own_revoked_account() {
        let target = Target { login: "alice", active: false };
        let result = authorize(&alice(), Operation::UpdateProfile, Some(target));
        assert!(matches!(result, Err(AppError::InactiveAccount(_))));
    }

    #[test]
    fn test_user_denied_admin_operations() {
        let target = Target { login: "alice", active: true };
        for op in [
            Operation::CreateUser,
            Operation::Delete,
            Operation::Restore,
            Operation::ListActive,
            Operation::GetByLogin,
            Operation::ListOlderThan,
        ] {
            let result = authorize(&alice(), op, Some(target));
            assert!(matches!(result, Err(AppError::Forbidden(_))), "{:?}", op);
        }
    }

    #[test]
    fn test_user_denied_without_target() {
        let result = authorize(&alice(), Operation::UpdateProfile, None);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
