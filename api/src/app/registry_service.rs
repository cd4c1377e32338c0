//! Registry service
//!
//! Complainants, controllers, responsibles and the lookup tables.

use std::sync::Arc;

use crate::app::validation::{self, MAX_LOOKUP_NAME_LEN, MAX_NAME_LEN};
use crate::domain::entities::{
    normalize_document, Lookup, LookupId, LookupKind, LookupUpdate, NewLookup, NewParty,
    NewResponsible, Party, PartyId, PartyKind, PartyUpdate, Responsible, ResponsibleId,
    ResponsibleUpdate, UserId,
};
use crate::domain::ports::{
    LookupRepository, PartyRepository, ResponsibleRepository, UserRepository,
};
use crate::error::{AppError, DomainError};

pub struct RegistryService {
    parties: Arc<dyn PartyRepository>,
    lookups: Arc<dyn LookupRepository>,
    responsibles: Arc<dyn ResponsibleRepository>,
    users: Arc<dyn UserRepository>,
}

impl RegistryService {
    pub fn new(
        parties: Arc<dyn PartyRepository>,
        lookups: Arc<dyn LookupRepository>,
        responsibles: Arc<dyn ResponsibleRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            parties,
            lookups,
            responsibles,
            users,
        }
    }

    // ------------------------------------------------------------------
    // Parties
    // ------------------------------------------------------------------

    pub async fn create_party(&self, new: NewParty) -> Result<Party, AppError> {
        let party = NewParty {
            kind: new.kind,
            name: validation::name("Name", &new.name, MAX_NAME_LEN)?,
            document: normalize_optional_document(new.document.as_deref())?,
            email: normalize_optional_email(new.email.as_deref())?,
            phone: validation::optional(new.phone.as_deref()),
        };

        let party = self.parties.create(&party).await?;
        tracing::info!(party_id = %party.id, kind = %party.kind, "Party created");

        Ok(party)
    }

    pub async fn get_party(&self, kind: PartyKind, id: &PartyId) -> Result<Party, AppError> {
        match self.parties.find_by_id(id).await? {
            Some(party) if party.kind == kind => Ok(party),
            _ => Err(AppError::NotFound(format!("{} {} not found", kind, id))),
        }
    }

    pub async fn list_parties(
        &self,
        kind: PartyKind,
        search: Option<&str>,
        include_inactive: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Party>, AppError> {
        let (limit, offset) = validation::page(limit, offset);
        let search = validation::optional(search);

        Ok(self
            .parties
            .list(kind, search.as_deref(), include_inactive, limit, offset)
            .await?)
    }

    pub async fn update_party(
        &self,
        kind: PartyKind,
        id: &PartyId,
        update: PartyUpdate,
    ) -> Result<Party, AppError> {
        self.get_party(kind, id).await?;

        let update = PartyUpdate {
            name: update
                .name
                .map(|n| validation::name("Name", &n, MAX_NAME_LEN))
                .transpose()?,
            document: normalize_optional_document(update.document.as_deref())?,
            email: normalize_optional_email(update.email.as_deref())?,
            phone: validation::optional(update.phone.as_deref()),
            active: update.active,
        };

        Ok(self.parties.update(id, &update).await?)
    }

    pub async fn deactivate_party(&self, kind: PartyKind, id: &PartyId) -> Result<(), AppError> {
        self.get_party(kind, id).await?;
        self.parties.deactivate(id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Responsibles
    // ------------------------------------------------------------------

    pub async fn create_responsible(&self, new: NewResponsible) -> Result<Responsible, AppError> {
        self.check_user(new.user_id).await?;

        let responsible = NewResponsible {
            name: validation::name("Name", &new.name, MAX_NAME_LEN)?,
            email: normalize_optional_email(new.email.as_deref())?,
            user_id: new.user_id,
        };

        Ok(self.responsibles.create(&responsible).await?)
    }

    pub async fn get_responsible(&self, id: &ResponsibleId) -> Result<Responsible, AppError> {
        self.responsibles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Responsible {} not found", id)))
    }

    pub async fn list_responsibles(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<Responsible>, AppError> {
        Ok(self.responsibles.list(include_inactive).await?)
    }

    pub async fn update_responsible(
        &self,
        id: &ResponsibleId,
        update: ResponsibleUpdate,
    ) -> Result<Responsible, AppError> {
        self.get_responsible(id).await?;
        self.check_user(update.user_id).await?;

        let update = ResponsibleUpdate {
            name: update
                .name
                .map(|n| validation::name("Name", &n, MAX_NAME_LEN))
                .transpose()?,
            email: normalize_optional_email(update.email.as_deref())?,
            user_id: update.user_id,
            active: update.active,
        };

        Ok(self.responsibles.update(id, &update).await?)
    }

    pub async fn deactivate_responsible(&self, id: &ResponsibleId) -> Result<(), AppError> {
        self.get_responsible(id).await?;
        self.responsibles.deactivate(id).await?;
        Ok(())
    }

    async fn check_user(&self, user_id: Option<UserId>) -> Result<(), AppError> {
        if let Some(user_id) = user_id {
            if self.users.find_by_id(&user_id).await?.is_none() {
                return Err(AppError::Domain(DomainError::Validation(format!(
                    "Unknown user: {}",
                    user_id
                ))));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub async fn create_lookup(&self, kind: LookupKind, name: &str) -> Result<Lookup, AppError> {
        let name = validation::name("Name", name, MAX_LOOKUP_NAME_LEN)?;

        if self.lookups.find_by_name(kind, &name).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "{} '{}' already exists",
                kind, name
            ))));
        }

        Ok(self.lookups.create(&NewLookup { kind, name }).await?)
    }

    pub async fn get_lookup(&self, kind: LookupKind, id: &LookupId) -> Result<Lookup, AppError> {
        match self.lookups.find_by_id(id).await? {
            Some(lookup) if lookup.kind == kind => Ok(lookup),
            _ => Err(AppError::NotFound(format!("{} {} not found", kind, id))),
        }
    }

    pub async fn list_lookups(
        &self,
        kind: LookupKind,
        include_inactive: bool,
    ) -> Result<Vec<Lookup>, AppError> {
        Ok(self.lookups.list(kind, include_inactive).await?)
    }

    pub async fn update_lookup(
        &self,
        kind: LookupKind,
        id: &LookupId,
        update: LookupUpdate,
    ) -> Result<Lookup, AppError> {
        self.get_lookup(kind, id).await?;

        let name = update
            .name
            .map(|n| validation::name("Name", &n, MAX_LOOKUP_NAME_LEN))
            .transpose()?;
        if let Some(name) = &name {
            if let Some(other) = self.lookups.find_by_name(kind, name).await? {
                if other.id != *id {
                    return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                        "{} '{}' already exists",
                        kind, name
                    ))));
                }
            }
        }

        Ok(self
            .lookups
            .update(
                id,
                &LookupUpdate {
                    name,
                    active: update.active,
                },
            )
            .await?)
    }

    pub async fn deactivate_lookup(&self, kind: LookupKind, id: &LookupId) -> Result<(), AppError> {
        self.get_lookup(kind, id).await?;
        self.lookups.deactivate(id).await?;
        Ok(())
    }
}

fn normalize_optional_document(raw: Option<&str>) -> Result<Option<String>, AppError> {
    validation::optional(raw)
        .map(|d| normalize_document(&d).map_err(|e| AppError::Domain(DomainError::Validation(e))))
        .transpose()
}

fn normalize_optional_email(raw: Option<&str>) -> Result<Option<String>, AppError> {
    validation::optional(raw)
        .map(|e| validation::email(&e))
        .transpose()
}
