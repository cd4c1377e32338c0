//! Access service
//!
//! Profiles, permissions and users, plus the permission check every
//! protected handler goes through.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::app::permission_cache::{GrantSet, PermissionCache};
use crate::app::validation;
use crate::domain::entities::{
    Action, Grant, NewPermission, NewProfile, NewUser, Permission, PermissionId, Profile,
    ProfileId, ProfileUpdate, Resource, User, UserId, UserUpdate,
};
use crate::domain::ports::{PermissionRepository, ProfileRepository, UserRepository};
use crate::error::{AppError, DomainError};

pub const ADMIN_PROFILE_NAME: &str = "Administrador";
const MAX_PROFILE_NAME_LEN: usize = 100;
const MAX_USER_NAME_LEN: usize = 200;

pub struct AccessService {
    profiles: Arc<dyn ProfileRepository>,
    permissions: Arc<dyn PermissionRepository>,
    users: Arc<dyn UserRepository>,
    cache: PermissionCache,
    allowed_email_domain: Option<String>,
    bootstrap_token: Option<String>,
}

impl AccessService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        permissions: Arc<dyn PermissionRepository>,
        users: Arc<dyn UserRepository>,
        cache: PermissionCache,
        allowed_email_domain: Option<String>,
        bootstrap_token: Option<String>,
    ) -> Self {
        Self {
            profiles,
            permissions,
            users,
            cache,
            allowed_email_domain,
            bootstrap_token,
        }
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// Effective grants of a user's profile
    ///
    /// Inactive or missing profiles resolve to no grants.
    pub async fn grants_for(&self, user: &User) -> Result<GrantSet, AppError> {
        if let Some(grants) = self.cache.get(&user.profile_id) {
            return Ok(grants);
        }

        // Taken before reading so a write that lands mid-lookup discards
        // what we are about to cache.
        let generation = self.cache.generation();

        let grants: HashSet<Grant> = match self.profiles.find_by_id(&user.profile_id).await? {
            Some(profile) if profile.active => self
                .permissions
                .list_for_profile(&profile.id)
                .await?
                .iter()
                .map(Permission::grant)
                .collect(),
            _ => HashSet::new(),
        };

        Ok(self.cache.insert(user.profile_id, generation, grants))
    }

    pub async fn authorize(
        &self,
        user: &User,
        action: Action,
        resource: Resource,
    ) -> Result<(), AppError> {
        if !user.active {
            return Err(AppError::Domain(DomainError::Forbidden(
                "User is inactive".to_string(),
            )));
        }

        let grants = self.grants_for(user).await?;
        if grants.iter().any(|g| g.allows(action, resource)) {
            return Ok(());
        }

        tracing::debug!(user_id = %user.id, %action, %resource, "Permission denied");
        Err(AppError::Domain(DomainError::Forbidden(format!(
            "Missing permission: {} {}",
            action, resource
        ))))
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub async fn create_profile(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Profile, AppError> {
        let name = validation::name("Name", name, MAX_PROFILE_NAME_LEN)?;

        if self.profiles.find_by_name(&name).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Profile '{}' already exists",
                name
            ))));
        }

        let profile = self
            .profiles
            .create(&NewProfile {
                name,
                description: validation::optional(description),
            })
            .await?;
        self.cache.invalidate_all();

        Ok(profile)
    }

    pub async fn get_profile(&self, id: &ProfileId) -> Result<Profile, AppError> {
        self.profiles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    pub async fn list_profiles(&self, include_inactive: bool) -> Result<Vec<Profile>, AppError> {
        Ok(self.profiles.list(include_inactive).await?)
    }

    pub async fn update_profile(
        &self,
        id: &ProfileId,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        self.get_profile(id).await?;

        let name = update
            .name
            .map(|n| validation::name("Name", &n, MAX_PROFILE_NAME_LEN))
            .transpose()?;
        if let Some(name) = &name {
            if let Some(other) = self.profiles.find_by_name(name).await? {
                if other.id != *id {
                    return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                        "Profile '{}' already exists",
                        name
                    ))));
                }
            }
        }

        let profile = self
            .profiles
            .update(
                id,
                &ProfileUpdate {
                    name,
                    description: update.description,
                    active: update.active,
                },
            )
            .await?;
        self.cache.invalidate_all();

        Ok(profile)
    }

    pub async fn deactivate_profile(&self, id: &ProfileId) -> Result<(), AppError> {
        self.get_profile(id).await?;
        self.profiles.deactivate(id).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    pub async fn list_permissions(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Permission>, AppError> {
        self.get_profile(profile_id).await?;
        Ok(self.permissions.list_for_profile(profile_id).await?)
    }

    pub async fn grant(
        &self,
        profile_id: &ProfileId,
        action: Action,
        resource: Resource,
    ) -> Result<Permission, AppError> {
        self.get_profile(profile_id).await?;

        let permission = self
            .permissions
            .create(&NewPermission {
                profile_id: *profile_id,
                action,
                resource,
            })
            .await?;
        self.cache.invalidate_all();
        tracing::info!(profile_id = %profile_id, %action, %resource, "Permission granted");

        Ok(permission)
    }

    pub async fn revoke(
        &self,
        profile_id: &ProfileId,
        permission_id: &PermissionId,
    ) -> Result<Permission, AppError> {
        let permission = match self.permissions.find_by_id(permission_id).await? {
            Some(p) if p.profile_id == *profile_id => p,
            _ => {
                return Err(AppError::NotFound(format!(
                    "Permission {} not found",
                    permission_id
                )))
            }
        };

        self.permissions.delete(permission_id).await?;
        self.cache.invalidate_all();
        tracing::info!(
            profile_id = %profile_id,
            action = %permission.action,
            resource = %permission.resource,
            "Permission revoked"
        );

        Ok(permission)
    }

    /// Replace the whole grant set of a profile; duplicates are collapsed
    pub async fn replace_permissions(
        &self,
        profile_id: &ProfileId,
        grants: &[Grant],
    ) -> Result<Vec<Permission>, AppError> {
        self.get_profile(profile_id).await?;

        let mut seen = HashSet::new();
        let permissions: Vec<NewPermission> = grants
            .iter()
            .filter(|g| seen.insert(**g))
            .map(|g| NewPermission {
                profile_id: *profile_id,
                action: g.action,
                resource: g.resource,
            })
            .collect();

        let replaced = self
            .permissions
            .replace_for_profile(profile_id, &permissions)
            .await?;
        self.cache.invalidate_all();

        Ok(replaced)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Create a user and return it with its API key (only shown once)
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        profile_id: &ProfileId,
    ) -> Result<(User, String), AppError> {
        let name = validation::name("Name", name, MAX_USER_NAME_LEN)?;
        let email = self.check_email(email)?;

        self.require_active_profile(profile_id).await?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                email
            ))));
        }

        let api_key = generate_api_key();
        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                profile_id: *profile_id,
                api_key_hash: hash_api_key(&api_key),
            })
            .await?;
        tracing::info!(user_id = %user.id, "User created");

        Ok((user, api_key))
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list_users(
        &self,
        include_inactive: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, AppError> {
        let (limit, offset) = validation::page(limit, offset);
        Ok(self.users.list(include_inactive, limit, offset).await?)
    }

    pub async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<User, AppError> {
        self.get_user(id).await?;

        if let Some(profile_id) = &update.profile_id {
            self.require_active_profile(profile_id).await?;
        }

        let update = UserUpdate {
            name: update
                .name
                .map(|n| validation::name("Name", &n, MAX_USER_NAME_LEN))
                .transpose()?,
            profile_id: update.profile_id,
            active: update.active,
        };

        Ok(self.users.update(id, &update).await?)
    }

    /// Users can only be assigned to profiles that exist and are active
    async fn require_active_profile(&self, profile_id: &ProfileId) -> Result<(), AppError> {
        match self.profiles.find_by_id(profile_id).await? {
            Some(profile) if profile.active => Ok(()),
            _ => Err(AppError::Domain(DomainError::Validation(format!(
                "Unknown profile: {}",
                profile_id
            )))),
        }
    }

    pub async fn deactivate_user(&self, id: &UserId) -> Result<(), AppError> {
        self.get_user(id).await?;
        self.users.deactivate(id).await?;
        Ok(())
    }

    /// Issue a new API key; the previous one stops working immediately
    pub async fn rotate_key(&self, id: &UserId) -> Result<(User, String), AppError> {
        let user = self.get_user(id).await?;
        let api_key = generate_api_key();

        self.users
            .update_api_key_hash(id, &hash_api_key(&api_key))
            .await?;
        tracing::info!(user_id = %id, "API key rotated");

        Ok((user, api_key))
    }

    pub async fn find_by_api_key(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_api_key_hash(api_key_hash).await?)
    }

    /// Update a user's last seen timestamp
    pub async fn touch(&self, id: &UserId) -> Result<(), AppError> {
        self.users.update_last_seen(id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    /// Create the administrator profile and the first user
    ///
    /// Only possible while no user exists and only with the configured token.
    pub async fn bootstrap(
        &self,
        token: &str,
        name: &str,
        email: &str,
    ) -> Result<(User, String), AppError> {
        let expected = self
            .bootstrap_token
            .as_deref()
            .ok_or_else(|| AppError::NotFound("Bootstrap is disabled".to_string()))?;

        if hash_api_key(token) != hash_api_key(expected) {
            return Err(AppError::Unauthorized);
        }

        if self.users.count().await? > 0 {
            return Err(AppError::Domain(DomainError::Conflict(
                "System is already bootstrapped".to_string(),
            )));
        }

        let profile = match self.profiles.find_by_name(ADMIN_PROFILE_NAME).await? {
            Some(profile) => profile,
            None => {
                self.profiles
                    .create(&NewProfile {
                        name: ADMIN_PROFILE_NAME.to_string(),
                        description: Some("Full access".to_string()),
                    })
                    .await?
            }
        };
        self.permissions
            .replace_for_profile(
                &profile.id,
                &[NewPermission {
                    profile_id: profile.id,
                    action: Action::Manage,
                    resource: Resource::All,
                }],
            )
            .await?;
        self.cache.invalidate_all();

        let (user, api_key) = self.create_user(name, email, &profile.id).await?;
        tracing::info!(user_id = %user.id, profile_id = %profile.id, "System bootstrapped");

        Ok((user, api_key))
    }

    fn check_email(&self, raw: &str) -> Result<String, AppError> {
        let email = validation::email(raw)?;

        if let Some(domain) = &self.allowed_email_domain {
            let matches = email
                .rsplit_once('@')
                .map(|(_, d)| d == domain)
                .unwrap_or(false);
            if !matches {
                return Err(AppError::Domain(DomainError::Validation(format!(
                    "Email must belong to the {} domain",
                    domain
                ))));
            }
        }

        Ok(email)
    }
}

/// Generate a random API key
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("ak-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
