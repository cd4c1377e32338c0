//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::entities::{
    AuditFilter, AuditLog, AuditLogId, ImportOutcome, ImportRow, Lookup, LookupId, LookupKind,
    LookupUpdate, NewAuditLog, NewLookup, NewParty, NewPermission, NewProcess, NewProfile,
    NewResponsible, NewUser, Party, PartyId, PartyKind, PartyUpdate, Permission, PermissionId,
    Process, ProcessFilter, ProcessId, ProcessUpdate, Profile, ProfileId, ProfileUpdate, ReportRow,
    Responsible, ResponsibleId, ResponsibleUpdate, User, UserId, UserUpdate,
};
use crate::domain::ports::{
    AuditLogRepository, LookupRepository, PartyRepository, PermissionRepository,
    ProcessImportRepository, ProcessRepository, ProfileRepository, ResponsibleRepository,
    UserRepository,
};
use crate::error::DomainError;

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ============================================================================
// In-Memory Process Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryProcessRepository {
    processes: Arc<RwLock<HashMap<ProcessId, Process>>>,
}

impl InMemoryProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a process for testing
    pub fn with_process(self, process: Process) -> Self {
        self.processes.write().unwrap().insert(process.id, process);
        self
    }

    /// Whether a process with this exact number is stored
    pub fn contains_number(&self, number: &str) -> bool {
        self.processes
            .read()
            .unwrap()
            .values()
            .any(|p| p.number == number)
    }
}

#[async_trait]
impl ProcessRepository for InMemoryProcessRepository {
    async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>, DomainError> {
        Ok(self.processes.read().unwrap().get(id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Process>, DomainError> {
        Ok(self
            .processes
            .read()
            .unwrap()
            .values()
            .find(|p| p.number == number)
            .cloned())
    }

    async fn list(&self, filter: &ProcessFilter) -> Result<(Vec<Process>, u64), DomainError> {
        let processes = self.processes.read().unwrap();
        let mut matching: Vec<Process> = processes
            .values()
            .filter(|p| filter.include_inactive || p.active)
            .filter(|p| {
                filter
                    .search
                    .as_deref()
                    .map(|s| p.number.to_lowercase().contains(&s.to_lowercase()))
                    .unwrap_or(true)
            })
            .filter(|p| filter.situation_id.is_none() || p.situation_id == filter.situation_id)
            .filter(|p| {
                filter.responsible_id.is_none() || p.responsible_id == filter.responsible_id
            })
            .filter(|p| {
                filter.entry_channel_id.is_none() || p.entry_channel_id == filter.entry_channel_id
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn create(&self, new: &NewProcess) -> Result<Process, DomainError> {
        let mut processes = self.processes.write().unwrap();
        if processes.values().any(|p| p.number == new.number) {
            return Err(DomainError::AlreadyExists(new.number.clone()));
        }

        let process = Process {
            id: ProcessId(Uuid::new_v4()),
            number: new.number.clone(),
            complainant_id: new.complainant_id,
            controller_id: new.controller_id,
            responsible_id: new.responsible_id,
            entry_channel_id: new.entry_channel_id,
            situation_id: new.situation_id,
            referral_id: new.referral_id,
            description: new.description.clone(),
            received_at: new.received_at,
            closed_at: new.closed_at,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        processes.insert(process.id, process.clone());
        Ok(process)
    }

    async fn update(&self, id: &ProcessId, update: &ProcessUpdate) -> Result<Process, DomainError> {
        let mut processes = self.processes.write().unwrap();
        let current = processes
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Process {} not found", id)))?;

        let mut updated = update.apply_to(current);
        updated.updated_at = Utc::now();
        processes.insert(*id, updated.clone());
        Ok(updated)
    }

    async fn deactivate(&self, id: &ProcessId) -> Result<(), DomainError> {
        let mut processes = self.processes.write().unwrap();
        let process = processes
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Process {} not found", id)))?;
        process.active = false;
        Ok(())
    }

    async fn report_rows(&self) -> Result<Vec<ReportRow>, DomainError> {
        Ok(self
            .processes
            .read()
            .unwrap()
            .values()
            .map(|p| ReportRow {
                situation_id: p.situation_id,
                entry_channel_id: p.entry_channel_id,
                responsible_id: p.responsible_id,
                received_at: p.received_at,
                closed_at: p.closed_at,
                active: p.active,
            })
            .collect())
    }
}

// ============================================================================
// In-Memory Party Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryPartyRepository {
    parties: Arc<RwLock<HashMap<PartyId, Party>>>,
}

impl InMemoryPartyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_party(self, party: Party) -> Self {
        self.parties.write().unwrap().insert(party.id, party);
        self
    }
}

#[async_trait]
impl PartyRepository for InMemoryPartyRepository {
    async fn find_by_id(&self, id: &PartyId) -> Result<Option<Party>, DomainError> {
        Ok(self.parties.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(
        &self,
        kind: PartyKind,
        name: &str,
    ) -> Result<Option<Party>, DomainError> {
        let parties = self.parties.read().unwrap();
        let mut matches: Vec<&Party> = parties
            .values()
            .filter(|p| p.kind == kind && same_name(&p.name, name))
            .collect();
        matches.sort_by_key(|p| p.created_at);
        Ok(matches.first().map(|p| (*p).clone()))
    }

    async fn list(
        &self,
        kind: PartyKind,
        search: Option<&str>,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Party>, DomainError> {
        let parties = self.parties.read().unwrap();
        let mut matching: Vec<Party> = parties
            .values()
            .filter(|p| p.kind == kind && (include_inactive || p.active))
            .filter(|p| {
                search
                    .map(|s| p.name.to_lowercase().contains(&s.to_lowercase()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn create(&self, new: &NewParty) -> Result<Party, DomainError> {
        let party = Party {
            id: PartyId(Uuid::new_v4()),
            kind: new.kind,
            name: new.name.clone(),
            document: new.document.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.parties
            .write()
            .unwrap()
            .insert(party.id, party.clone());
        Ok(party)
    }

    async fn update(&self, id: &PartyId, update: &PartyUpdate) -> Result<Party, DomainError> {
        let mut parties = self.parties.write().unwrap();
        let party = parties
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Party {} not found", id)))?;

        if let Some(name) = &update.name {
            party.name = name.clone();
        }
        if update.document.is_some() {
            party.document = update.document.clone();
        }
        if update.email.is_some() {
            party.email = update.email.clone();
        }
        if update.phone.is_some() {
            party.phone = update.phone.clone();
        }
        if let Some(active) = update.active {
            party.active = active;
        }
        party.updated_at = Utc::now();
        Ok(party.clone())
    }

    async fn deactivate(&self, id: &PartyId) -> Result<(), DomainError> {
        let mut parties = self.parties.write().unwrap();
        let party = parties
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Party {} not found", id)))?;
        party.active = false;
        Ok(())
    }
}

// ============================================================================
// In-Memory Lookup Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryLookupRepository {
    lookups: Arc<RwLock<HashMap<LookupId, Lookup>>>,
}

impl InMemoryLookupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup(self, lookup: Lookup) -> Self {
        self.lookups.write().unwrap().insert(lookup.id, lookup);
        self
    }
}

#[async_trait]
impl LookupRepository for InMemoryLookupRepository {
    async fn find_by_id(&self, id: &LookupId) -> Result<Option<Lookup>, DomainError> {
        Ok(self.lookups.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(
        &self,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Lookup>, DomainError> {
        Ok(self
            .lookups
            .read()
            .unwrap()
            .values()
            .find(|l| l.kind == kind && same_name(&l.name, name))
            .cloned())
    }

    async fn list(
        &self,
        kind: LookupKind,
        include_inactive: bool,
    ) -> Result<Vec<Lookup>, DomainError> {
        let mut lookups: Vec<Lookup> = self
            .lookups
            .read()
            .unwrap()
            .values()
            .filter(|l| l.kind == kind && (include_inactive || l.active))
            .cloned()
            .collect();
        lookups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lookups)
    }

    async fn create(&self, new: &NewLookup) -> Result<Lookup, DomainError> {
        let mut lookups = self.lookups.write().unwrap();
        if lookups
            .values()
            .any(|l| l.kind == new.kind && same_name(&l.name, &new.name))
        {
            return Err(DomainError::AlreadyExists(new.name.clone()));
        }

        let lookup = Lookup {
            id: LookupId(Uuid::new_v4()),
            kind: new.kind,
            name: new.name.clone(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        lookups.insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn update(&self, id: &LookupId, update: &LookupUpdate) -> Result<Lookup, DomainError> {
        let mut lookups = self.lookups.write().unwrap();
        let lookup = lookups
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Lookup {} not found", id)))?;

        if let Some(name) = &update.name {
            lookup.name = name.clone();
        }
        if let Some(active) = update.active {
            lookup.active = active;
        }
        lookup.updated_at = Utc::now();
        Ok(lookup.clone())
    }

    async fn deactivate(&self, id: &LookupId) -> Result<(), DomainError> {
        let mut lookups = self.lookups.write().unwrap();
        let lookup = lookups
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Lookup {} not found", id)))?;
        lookup.active = false;
        Ok(())
    }
}

// ============================================================================
// In-Memory Responsible Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryResponsibleRepository {
    responsibles: Arc<RwLock<HashMap<ResponsibleId, Responsible>>>,
}

impl InMemoryResponsibleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responsible(self, responsible: Responsible) -> Self {
        self.responsibles
            .write()
            .unwrap()
            .insert(responsible.id, responsible);
        self
    }
}

#[async_trait]
impl ResponsibleRepository for InMemoryResponsibleRepository {
    async fn find_by_id(&self, id: &ResponsibleId) -> Result<Option<Responsible>, DomainError> {
        Ok(self.responsibles.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Responsible>, DomainError> {
        Ok(self
            .responsibles
            .read()
            .unwrap()
            .values()
            .find(|r| same_name(&r.name, name))
            .cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Responsible>, DomainError> {
        let mut responsibles: Vec<Responsible> = self
            .responsibles
            .read()
            .unwrap()
            .values()
            .filter(|r| include_inactive || r.active)
            .cloned()
            .collect();
        responsibles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(responsibles)
    }

    async fn create(&self, new: &NewResponsible) -> Result<Responsible, DomainError> {
        let responsible = Responsible {
            id: ResponsibleId(Uuid::new_v4()),
            name: new.name.clone(),
            email: new.email.clone(),
            user_id: new.user_id,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.responsibles
            .write()
            .unwrap()
            .insert(responsible.id, responsible.clone());
        Ok(responsible)
    }

    async fn update(
        &self,
        id: &ResponsibleId,
        update: &ResponsibleUpdate,
    ) -> Result<Responsible, DomainError> {
        let mut responsibles = self.responsibles.write().unwrap();
        let responsible = responsibles
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Responsible {} not found", id)))?;

        if let Some(name) = &update.name {
            responsible.name = name.clone();
        }
        if update.email.is_some() {
            responsible.email = update.email.clone();
        }
        if update.user_id.is_some() {
            responsible.user_id = update.user_id;
        }
        if let Some(active) = update.active {
            responsible.active = active;
        }
        responsible.updated_at = Utc::now();
        Ok(responsible.clone())
    }

    async fn deactivate(&self, id: &ResponsibleId) -> Result<(), DomainError> {
        let mut responsibles = self.responsibles.write().unwrap();
        let responsible = responsibles
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Responsible {} not found", id)))?;
        responsible.active = false;
        Ok(())
    }
}

// ============================================================================
// In-Memory Profile Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<ProfileId, Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        self.profiles.write().unwrap().insert(profile.id, profile);
        self
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>, DomainError> {
        Ok(self
            .profiles
            .read()
            .unwrap()
            .values()
            .find(|p| same_name(&p.name, name))
            .cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Profile>, DomainError> {
        let mut profiles: Vec<Profile> = self
            .profiles
            .read()
            .unwrap()
            .values()
            .filter(|p| include_inactive || p.active)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    async fn create(&self, new: &NewProfile) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().unwrap();
        if profiles.values().any(|p| same_name(&p.name, &new.name)) {
            return Err(DomainError::AlreadyExists(new.name.clone()));
        }

        let profile = Profile {
            id: ProfileId(Uuid::new_v4()),
            name: new.name.clone(),
            description: new.description.clone(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, id: &ProfileId, update: &ProfileUpdate) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().unwrap();
        let profile = profiles
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Profile {} not found", id)))?;

        if let Some(name) = &update.name {
            profile.name = name.clone();
        }
        if update.description.is_some() {
            profile.description = update.description.clone();
        }
        if let Some(active) = update.active {
            profile.active = active;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn deactivate(&self, id: &ProfileId) -> Result<(), DomainError> {
        let mut profiles = self.profiles.write().unwrap();
        let profile = profiles
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Profile {} not found", id)))?;
        profile.active = false;
        Ok(())
    }
}

// ============================================================================
// In-Memory Permission Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryPermissionRepository {
    permissions: Arc<RwLock<HashMap<PermissionId, Permission>>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(new: &NewPermission) -> Permission {
        Permission {
            id: PermissionId(Uuid::new_v4()),
            profile_id: new.profile_id,
            action: new.action,
            resource: new.resource,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn find_by_id(&self, id: &PermissionId) -> Result<Option<Permission>, DomainError> {
        Ok(self.permissions.read().unwrap().get(id).cloned())
    }

    async fn list_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Permission>, DomainError> {
        Ok(self
            .permissions
            .read()
            .unwrap()
            .values()
            .filter(|p| p.profile_id == *profile_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new: &NewPermission) -> Result<Permission, DomainError> {
        let mut permissions = self.permissions.write().unwrap();
        if permissions.values().any(|p| {
            p.profile_id == new.profile_id && p.action == new.action && p.resource == new.resource
        }) {
            return Err(DomainError::AlreadyExists(format!(
                "{} {}",
                new.action, new.resource
            )));
        }

        let permission = Self::build(new);
        permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn delete(&self, id: &PermissionId) -> Result<(), DomainError> {
        self.permissions
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Permission {} not found", id)))
    }

    async fn replace_for_profile(
        &self,
        profile_id: &ProfileId,
        new: &[NewPermission],
    ) -> Result<Vec<Permission>, DomainError> {
        let mut permissions = self.permissions.write().unwrap();
        permissions.retain(|_, p| p.profile_id != *profile_id);

        let created: Vec<Permission> = new.iter().map(Self::build).collect();
        for permission in &created {
            permissions.insert(permission.id, permission.clone());
        }
        Ok(created)
    }
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }

    fn modify(
        &self,
        id: &UserId,
        f: impl FnOnce(&mut User),
    ) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;
        f(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.api_key_hash == hash)
            .cloned())
    }

    async fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, DomainError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .unwrap()
            .values()
            .filter(|u| include_inactive || u.active)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.users.read().unwrap().len() as u64)
    }

    async fn create(&self, new: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == new.email) {
            return Err(DomainError::AlreadyExists(new.email.clone()));
        }

        let user = User {
            id: UserId(Uuid::new_v4()),
            name: new.name.clone(),
            email: new.email.clone(),
            profile_id: new.profile_id,
            api_key_hash: new.api_key_hash.clone(),
            active: true,
            last_seen_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError> {
        self.modify(id, |user| {
            if let Some(name) = &update.name {
                user.name = name.clone();
            }
            if let Some(profile_id) = update.profile_id {
                user.profile_id = profile_id;
            }
            if let Some(active) = update.active {
                user.active = active;
            }
            user.updated_at = Utc::now();
        })
    }

    async fn update_api_key_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError> {
        self.modify(id, |user| user.api_key_hash = hash.to_string())?;
        Ok(())
    }

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError> {
        self.modify(id, |user| user.last_seen_at = Some(Utc::now()))?;
        Ok(())
    }

    async fn deactivate(&self, id: &UserId) -> Result<(), DomainError> {
        self.modify(id, |user| user.active = false)?;
        Ok(())
    }
}

// ============================================================================
// In-Memory Audit Log Repository
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryAuditLogRepository {
    entries: Arc<RwLock<Vec<AuditLog>>>,
    should_fail: bool,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with a database error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError> {
        if self.should_fail {
            return Err(DomainError::Database("audit storage unavailable".to_string()));
        }

        let log = AuditLog {
            id: AuditLogId(Uuid::new_v4()),
            user_id: entry.user_id,
            action: entry.action,
            resource: entry.resource,
            resource_id: entry.resource_id.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        };
        self.entries.write().unwrap().push(log.clone());
        Ok(log)
    }

    async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, DomainError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| filter.user_id.is_none() || e.user_id == filter.user_id)
            .filter(|e| filter.resource.is_none() || Some(e.resource) == filter.resource)
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }
}

// ============================================================================
// In-Memory Process Import Repository
// ============================================================================

/// Writes imported rows into the other in-memory repositories
///
/// Not transactional: a row is checked up front and then written, which is
/// enough for single-threaded tests.
#[derive(Clone)]
pub struct InMemoryProcessImportRepository {
    processes: InMemoryProcessRepository,
    parties: InMemoryPartyRepository,
    lookups: InMemoryLookupRepository,
    responsibles: InMemoryResponsibleRepository,
    fail_on: HashSet<String>,
}

impl InMemoryProcessImportRepository {
    pub fn new(
        processes: InMemoryProcessRepository,
        parties: InMemoryPartyRepository,
        lookups: InMemoryLookupRepository,
        responsibles: InMemoryResponsibleRepository,
    ) -> Self {
        Self {
            processes,
            parties,
            lookups,
            responsibles,
            fail_on: HashSet::new(),
        }
    }

    /// Make the row with this process number fail with a database error
    pub fn failing_on(mut self, number: &str) -> Self {
        self.fail_on.insert(number.to_string());
        self
    }

    async fn party(
        &self,
        kind: PartyKind,
        name: Option<&str>,
    ) -> Result<Option<PartyId>, DomainError> {
        let Some(name) = name else { return Ok(None) };
        if let Some(party) = self.parties.find_by_name(kind, name).await? {
            return Ok(Some(party.id));
        }
        Ok(Some(self.parties.create(&NewParty::named(kind, name)).await?.id))
    }

    async fn lookup(
        &self,
        kind: LookupKind,
        name: Option<&str>,
    ) -> Result<Option<LookupId>, DomainError> {
        let Some(name) = name else { return Ok(None) };
        if let Some(lookup) = self.lookups.find_by_name(kind, name).await? {
            return Ok(Some(lookup.id));
        }
        let new = NewLookup {
            kind,
            name: name.to_string(),
        };
        Ok(Some(self.lookups.create(&new).await?.id))
    }
}

#[async_trait]
impl ProcessImportRepository for InMemoryProcessImportRepository {
    async fn import_row(&self, row: &ImportRow) -> Result<ImportOutcome, DomainError> {
        if self.fail_on.contains(&row.number) {
            return Err(DomainError::Database("connection reset".to_string()));
        }
        if self.processes.find_by_number(&row.number).await?.is_some() {
            return Ok(ImportOutcome::Duplicate);
        }

        let responsible_id = match row.responsible.as_deref() {
            Some(name) => match self.responsibles.find_by_name(name).await? {
                Some(r) => Some(r.id),
                None => Some(
                    self.responsibles
                        .create(&NewResponsible {
                            name: name.to_string(),
                            email: None,
                            user_id: None,
                        })
                        .await?
                        .id,
                ),
            },
            None => None,
        };

        let new = NewProcess {
            number: row.number.clone(),
            complainant_id: self
                .party(PartyKind::Complainant, row.complainant.as_deref())
                .await?,
            controller_id: self
                .party(PartyKind::Controller, row.controller.as_deref())
                .await?,
            responsible_id,
            entry_channel_id: self
                .lookup(LookupKind::EntryChannel, row.entry_channel.as_deref())
                .await?,
            situation_id: self
                .lookup(LookupKind::Situation, row.situation.as_deref())
                .await?,
            referral_id: self
                .lookup(LookupKind::Referral, row.referral.as_deref())
                .await?,
            description: row.description.clone(),
            received_at: row.received_at,
            closed_at: row.closed_at,
        };

        let process = self.processes.create(&new).await?;
        Ok(ImportOutcome::Imported(process.id))
    }
}
