//! User directory
//!
//! The orchestration layer: resolves records through the repository,
//! consults the authorization policy, hashes credentials, and applies
//! the soft-delete lifecycle (active / revoked / restored / deleted).
//! Every operation is a single read-check-mutate-persist sequence; the
//! caller's identity is passed explicitly as a [`Principal`].

use crate::auth::policy::{authorize, Operation, Target};
use crate::auth::{hash_password, verify_password, Principal};
use crate::error::{duplicate_login, inactive_account, user_not_found, ApiResult};
use crate::repository::UserRepository;
use crate::user::{CreateUserRequest, Gender, ProfileUpdateRequest, User};
use chrono::{Months, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Login of the seeded administrator account
pub const ADMIN_LOGIN: &str = "Admin";
/// Known initial password of the seeded administrator
const ADMIN_PASSWORD: &str = "Admin123";
/// Actor name stamped on bootstrap-created records
const SYSTEM_ACTOR: &str = "System";

/// Directory of user accounts backed by an abstract repository
#[derive(Clone)]
pub struct UserDirectory {
    repo: Arc<dyn UserRepository>,
}

impl UserDirectory {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Seed the bootstrap administrator if it does not exist yet.
    ///
    /// Invoked once by the composition root during startup, before the
    /// server accepts requests. Idempotent: guarded by an existence
    /// check on the `Admin` login.
    pub async fn ensure_admin_exists(&self) -> ApiResult<()> {
        if self.repo.exists_by_login(ADMIN_LOGIN).await? {
            return Ok(());
        }

        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            login: ADMIN_LOGIN.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD),
            name: "Administrator".to_string(),
            gender: Gender::Male,
            birthday: None,
            admin: true,
            created_on: now,
            created_by: SYSTEM_ACTOR.to_string(),
            modified_on: now,
            modified_by: SYSTEM_ACTOR.to_string(),
            revoked_on: None,
            revoked_by: None,
        };

        self.repo.insert(admin).await?;
        info!("Bootstrap administrator '{}' created", ADMIN_LOGIN);
        Ok(())
    }

    /// Verify credentials against a login.
    ///
    /// Returns `None` on an unknown login or digest mismatch so callers
    /// cannot distinguish the two; a revoked account fails with
    /// `InactiveAccount` regardless of password correctness. This is the
    /// only path into token issuance.
    pub async fn authenticate(&self, login: &str, password: &str) -> ApiResult<Option<User>> {
        let Some(user) = self.repo.find_by_login(login).await? else {
            return Ok(None);
        };

        if !user.is_active() {
            return Err(inactive_account(login));
        }

        if !verify_password(password, &user.password_hash) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Create a new active user record; admin-only
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        principal: &Principal,
    ) -> ApiResult<User> {
        authorize(principal, Operation::CreateUser, None)?;

        // Pre-check only; the repository's unique index is authoritative.
        if self.repo.exists_by_login(&request.login).await? {
            return Err(duplicate_login(&request.login));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            login: request.login,
            password_hash: hash_password(&request.password),
            name: request.name,
            gender: request.gender,
            birthday: request.birthday,
            admin: request.admin,
            created_on: now,
            created_by: principal.login.clone(),
            modified_on: now,
            modified_by: principal.login.clone(),
            revoked_on: None,
            revoked_by: None,
        };

        let created = self.repo.insert(user).await?;
        info!(login = %created.login, admin = created.admin, "User created");
        Ok(created)
    }

    /// Apply a partial profile update; absent fields stay untouched
    pub async fn update_profile(
        &self,
        login: &str,
        changes: ProfileUpdateRequest,
        principal: &Principal,
    ) -> ApiResult<User> {
        let mut user = self.resolve(login).await?;
        self.authorize_against(principal, Operation::UpdateProfile, &user)?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(gender) = changes.gender {
            user.gender = gender;
        }
        if let Some(birthday) = changes.birthday {
            user.birthday = Some(birthday);
        }

        user.modified_on = Utc::now();
        user.modified_by = principal.login.clone();

        self.repo.update(user).await
    }

    /// Replace the stored credential digest
    pub async fn update_password(
        &self,
        login: &str,
        new_password: &str,
        principal: &Principal,
    ) -> ApiResult<User> {
        let mut user = self.resolve(login).await?;
        self.authorize_against(principal, Operation::UpdatePassword, &user)?;

        user.password_hash = hash_password(new_password);
        user.modified_on = Utc::now();
        user.modified_by = principal.login.clone();

        self.repo.update(user).await
    }

    /// Rename a login; authorization is evaluated against the old login
    pub async fn update_login(
        &self,
        login: &str,
        new_login: &str,
        principal: &Principal,
    ) -> ApiResult<User> {
        let mut user = self.resolve(login).await?;
        self.authorize_against(principal, Operation::UpdateLogin, &user)?;

        if self.repo.exists_by_login(new_login).await? {
            return Err(duplicate_login(new_login));
        }

        user.login = new_login.to_string();
        user.modified_on = Utc::now();
        user.modified_by = principal.login.clone();

        let updated = self.repo.update(user).await?;
        info!(old = login, new = new_login, "Login renamed");
        Ok(updated)
    }

    /// All active users ordered by creation time; admin-only
    pub async fn list_active(&self, principal: &Principal) -> ApiResult<Vec<User>> {
        authorize(principal, Operation::ListActive, None)?;

        let mut users = self.repo.list_where(&|u: &User| u.is_active()).await?;
        users.sort_by_key(|u| u.created_on);
        Ok(users)
    }

    /// Full record regardless of state, or `None` if absent; admin-only
    pub async fn get_by_login(
        &self,
        login: &str,
        principal: &Principal,
    ) -> ApiResult<Option<User>> {
        authorize(principal, Operation::GetByLogin, None)?;
        self.repo.find_by_login(login).await
    }

    /// Self-service record read gated by a password re-check.
    ///
    /// Returns `None` on an unknown login or digest mismatch; the
    /// account must be active. No role is involved, the credential is
    /// the proof of identity.
    pub async fn get_full_profile(
        &self,
        login: &str,
        password: &str,
    ) -> ApiResult<Option<User>> {
        let Some(user) = self.repo.find_by_login(login).await? else {
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash) {
            return Ok(None);
        }

        if !user.is_active() {
            return Err(inactive_account(login));
        }

        Ok(Some(user))
    }

    /// Users of any state older than `age_years`; records without a
    /// birthday are excluded. Admin-only.
    pub async fn list_older_than(
        &self,
        age_years: u32,
        principal: &Principal,
    ) -> ApiResult<Vec<User>> {
        authorize(principal, Operation::ListOlderThan, None)?;

        let Some(cutoff) = Utc::now()
            .date_naive()
            .checked_sub_months(Months::new(age_years.saturating_mul(12)))
        else {
            return Ok(Vec::new());
        };

        self.repo
            .list_where(&|u: &User| u.birthday.is_some_and(|b| b <= cutoff))
            .await
    }

    /// Soft-delete (revoke) or permanently remove a record; admin-only.
    ///
    /// A soft delete stamps the revocation pair; re-revoking an already
    /// inactive record overwrites the stamps. A hard delete is terminal
    /// and frees the login for reuse.
    pub async fn delete(&self, login: &str, soft: bool, principal: &Principal) -> ApiResult<()> {
        authorize(principal, Operation::Delete, None)?;
        let mut user = self.resolve(login).await?;

        if soft {
            user.revoked_on = Some(Utc::now());
            user.revoked_by = Some(principal.login.clone());
            self.repo.update(user).await?;
            info!(login, "User revoked");
        } else {
            self.repo.remove(user.id).await?;
            info!(login, "User permanently deleted");
        }

        Ok(())
    }

    /// Clear the revocation pair, returning the account to active.
    ///
    /// The pair is cleared unconditionally: restoring an already active
    /// record still bumps `modified_on`. Admin-only.
    pub async fn restore(&self, login: &str, principal: &Principal) -> ApiResult<User> {
        authorize(principal, Operation::Restore, None)?;
        let mut user = self.resolve(login).await?;

        user.revoked_on = None;
        user.revoked_by = None;
        user.modified_on = Utc::now();

        let restored = self.repo.update(user).await?;
        info!(login, "User restored");
        Ok(restored)
    }

    async fn resolve(&self, login: &str) -> ApiResult<User> {
        self.repo
            .find_by_login(login)
            .await?
            .ok_or_else(|| user_not_found(login))
    }

    fn authorize_against(
        &self,
        principal: &Principal,
        op: Operation,
        user: &User,
    ) -> ApiResult<()> {
        authorize(
            principal,
            op,
            Some(Target {
                login: &user.login,
                active: user.is_active(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::error::AppError;
    use crate::repository::MemoryUserRepository;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn admin() -> Principal {
        Principal::new(ADMIN_LOGIN, Role::Admin)
    }

    fn as_user(login: &str) -> Principal {
        Principal::new(login, Role::User)
    }

    fn create_req(login: &str, password: &str, is_admin: bool) -> CreateUserRequest {
        CreateUserRequest {
            login: login.to_string(),
            password: password.to_string(),
            name: "Testuser".to_string(),
            gender: Gender::Unspecified,
            birthday: None,
            admin: is_admin,
        }
    }

    async fn seeded() -> UserDirectory {
        let directory = UserDirectory::new(Arc::new(MemoryUserRepository::new()));
        directory.ensure_admin_exists().await.unwrap();
        directory
    }

    // Timestamps carry nanosecond precision, but give them room anyway.
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin_account() {
        let directory = seeded().await;

        let user = directory
            .authenticate("Admin", "Admin123")
            .await
            .unwrap()
            .expect("bootstrap admin should authenticate");
        assert!(user.admin);
        assert_eq!(user.name, "Administrator");
        assert_eq!(user.created_by, "System");
        assert!(user.is_active());

        assert!(directory
            .authenticate("Admin", "wrong")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let directory = seeded().await;
        directory.ensure_admin_exists().await.unwrap();

        let active = directory.list_active(&admin()).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_lookup_preserves_admin_flag() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        directory
            .create_user(create_req("boss", "pass123", true), &admin())
            .await
            .unwrap();

        let alice = directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .unwrap();
        assert!(!alice.admin);
        assert!(alice.is_active());
        assert_eq!(alice.created_by, "Admin");

        let boss = directory
            .get_by_login("boss", &admin())
            .await
            .unwrap()
            .unwrap();
        assert!(boss.admin);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_login_even_when_revoked() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        let result = directory
            .create_user(create_req("alice", "other", false), &admin())
            .await;
        assert!(matches!(result, Err(AppError::DuplicateLogin(_))));

        // A revoked record still holds its login.
        directory.delete("alice", true, &admin()).await.unwrap();
        let result = directory
            .create_user(create_req("alice", "other", false), &admin())
            .await;
        assert!(matches!(result, Err(AppError::DuplicateLogin(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin_role() {
        let directory = seeded().await;
        let result = directory
            .create_user(create_req("mallory", "pass123", false), &as_user("alice"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_authenticate_revoked_account_fails_regardless_of_password() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        directory.delete("alice", true, &admin()).await.unwrap();

        let result = directory.authenticate("alice", "pass123").await;
        assert!(matches!(result, Err(AppError::InactiveAccount(_))));

        let result = directory.authenticate("alice", "wrong").await;
        assert!(matches!(result, Err(AppError::InactiveAccount(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_login_returns_none() {
        let directory = seeded().await;
        assert!(directory
            .authenticate("ghost", "pass123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_profile_is_partial() {
        let directory = seeded().await;
        let birthday = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
        let mut request = create_req("alice", "pass123", false);
        request.gender = Gender::Female;
        request.birthday = Some(birthday);
        directory.create_user(request, &admin()).await.unwrap();

        tick().await;
        let changes = ProfileUpdateRequest {
            name: Some("Renamed".to_string()),
            gender: None,
            birthday: None,
        };
        let updated = directory
            .update_profile("alice", changes, &as_user("alice"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.gender, Gender::Female);
        assert_eq!(updated.birthday, Some(birthday));
        assert_eq!(updated.modified_by, "alice");
        assert!(updated.modified_on > updated.created_on);
    }

    #[tokio::test]
    async fn test_update_profile_unknown_login_is_not_found() {
        let directory = seeded().await;
        let result = directory
            .update_profile("ghost", ProfileUpdateRequest::default(), &admin())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_touch_other_accounts() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        directory
            .create_user(create_req("bob", "pass123", false), &admin())
            .await
            .unwrap();

        let alice = as_user("alice");
        let profile = directory
            .update_profile("bob", ProfileUpdateRequest::default(), &alice)
            .await;
        assert!(matches!(profile, Err(AppError::Forbidden(_))));

        let password = directory.update_password("bob", "newpass1", &alice).await;
        assert!(matches!(password, Err(AppError::Forbidden(_))));

        let login = directory.update_login("bob", "bobby", &alice).await;
        assert!(matches!(login, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_self_password_update_succeeds_and_stamps() {
        let directory = seeded().await;
        let created = directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        tick().await;
        let updated = directory
            .update_password("alice", "newpass1", &as_user("alice"))
            .await
            .unwrap();

        assert!(updated.modified_on > created.modified_on);
        assert_eq!(updated.modified_by, "alice");
        assert!(directory
            .authenticate("alice", "newpass1")
            .await
            .unwrap()
            .is_some());
        assert!(directory
            .authenticate("alice", "pass123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_self_service_on_revoked_account_is_inactive() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        directory.delete("alice", true, &admin()).await.unwrap();

        let result = directory
            .update_profile("alice", ProfileUpdateRequest::default(), &as_user("alice"))
            .await;
        assert!(matches!(result, Err(AppError::InactiveAccount(_))));
    }

    #[tokio::test]
    async fn test_update_login_rejects_taken_login() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        let result = directory
            .update_login("alice", "Admin", &as_user("alice"))
            .await;
        assert!(matches!(result, Err(AppError::DuplicateLogin(_))));
    }

    #[tokio::test]
    async fn test_update_login_renames_and_frees_old_login() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        let renamed = directory
            .update_login("alice", "alicia", &as_user("alice"))
            .await
            .unwrap();
        assert_eq!(renamed.login, "alicia");

        assert!(directory
            .authenticate("alicia", "pass123")
            .await
            .unwrap()
            .is_some());
        assert!(directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .is_none());

        // The old login is available again.
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_active_is_ordered_and_excludes_revoked() {
        let directory = seeded().await;
        tick().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        tick().await;
        directory
            .create_user(create_req("bob", "pass123", false), &admin())
            .await
            .unwrap();
        directory.delete("bob", true, &admin()).await.unwrap();
        tick().await;
        directory
            .create_user(create_req("carol", "pass123", false), &admin())
            .await
            .unwrap();

        let logins: Vec<String> = directory
            .list_active(&admin())
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["Admin", "alice", "carol"]);

        let result = directory.list_active(&as_user("alice")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_by_login_returns_revoked_records() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
        directory.delete("alice", true, &admin()).await.unwrap();

        let user = directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .unwrap();
        assert!(!user.is_active());

        let result = directory.get_by_login("alice", &as_user("bob")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_full_profile_is_credential_gated() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        let profile = directory
            .get_full_profile("alice", "pass123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.login, "alice");

        assert!(directory
            .get_full_profile("alice", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(directory
            .get_full_profile("ghost", "pass123")
            .await
            .unwrap()
            .is_none());

        directory.delete("alice", true, &admin()).await.unwrap();
        let result = directory.get_full_profile("alice", "pass123").await;
        assert!(matches!(result, Err(AppError::InactiveAccount(_))));
    }

    #[tokio::test]
    async fn test_list_older_than_excludes_missing_birthdays() {
        let directory = seeded().await;
        let today = Utc::now().date_naive();

        let mut old = create_req("elder", "pass123", false);
        old.birthday = today.checked_sub_months(Months::new(40 * 12));
        directory.create_user(old, &admin()).await.unwrap();

        let mut young = create_req("junior", "pass123", false);
        young.birthday = today.checked_sub_months(Months::new(20 * 12));
        directory.create_user(young, &admin()).await.unwrap();

        // The bootstrap admin has no birthday and must not appear.
        let logins: Vec<String> = directory
            .list_older_than(30, &admin())
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["elder"]);

        let result = directory.list_older_than(30, &as_user("junior")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore_cycle() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        directory.delete("alice", true, &admin()).await.unwrap();
        let revoked = directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .unwrap();
        assert!(revoked.revoked_on.is_some());
        assert_eq!(revoked.revoked_by.as_deref(), Some("Admin"));

        tick().await;
        let restored = directory.restore("alice", &admin()).await.unwrap();
        assert!(restored.revoked_on.is_none());
        assert!(restored.revoked_by.is_none());
        assert!(restored.modified_on > revoked.modified_on);
        assert!(directory
            .authenticate("alice", "pass123")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_restore_on_active_account_still_bumps_modified_on() {
        let directory = seeded().await;
        let created = directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        tick().await;
        let restored = directory.restore("alice", &admin()).await.unwrap();
        assert!(restored.is_active());
        assert!(restored.modified_on > created.modified_on);
    }

    #[tokio::test]
    async fn test_hard_delete_is_terminal_and_frees_login() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        directory.delete("alice", false, &admin()).await.unwrap();
        assert!(directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .is_none());

        let result = directory.restore("alice", &admin()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_and_restore_require_admin() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        let alice = as_user("alice");
        let result = directory.delete("alice", true, &alice).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let result = directory.restore("alice", &alice).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_re_revoking_overwrites_stamps() {
        let directory = seeded().await;
        directory
            .create_user(create_req("alice", "pass123", false), &admin())
            .await
            .unwrap();

        directory.delete("alice", true, &admin()).await.unwrap();
        let first = directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .unwrap();

        tick().await;
        directory.delete("alice", true, &admin()).await.unwrap();
        let second = directory
            .get_by_login("alice", &admin())
            .await
            .unwrap()
            .unwrap();

        assert!(second.revoked_on.unwrap() > first.revoked_on.unwrap());
    }
}
