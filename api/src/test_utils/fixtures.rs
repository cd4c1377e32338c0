//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    Lookup, LookupId, LookupKind, Party, PartyId, PartyKind, Process, ProcessId, Profile,
    ProfileId, Responsible, ResponsibleId, User, UserId,
};

/// Create an active process with only its number set
pub fn test_process(number: &str) -> Process {
    Process {
        id: ProcessId(Uuid::new_v4()),
        number: number.to_string(),
        complainant_id: None,
        controller_id: None,
        responsible_id: None,
        entry_channel_id: None,
        situation_id: None,
        referral_id: None,
        description: None,
        received_at: None,
        closed_at: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Create an active complainant or controller
pub fn test_party(kind: PartyKind, name: &str) -> Party {
    Party {
        id: PartyId(Uuid::new_v4()),
        kind,
        name: name.to_string(),
        document: None,
        email: None,
        phone: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_lookup(kind: LookupKind, name: &str) -> Lookup {
    Lookup {
        id: LookupId(Uuid::new_v4()),
        kind,
        name: name.to_string(),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_responsible(name: &str) -> Responsible {
    Responsible {
        id: ResponsibleId(Uuid::new_v4()),
        name: name.to_string(),
        email: None,
        user_id: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_profile(name: &str) -> Profile {
    Profile {
        id: ProfileId(Uuid::new_v4()),
        name: name.to_string(),
        description: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Create a test user with default values
pub fn test_user() -> User {
    test_user_with_profile(ProfileId(Uuid::new_v4()))
}

/// Create a test user attached to a specific profile
pub fn test_user_with_profile(profile_id: ProfileId) -> User {
    let id = UserId(Uuid::new_v4());
    User {
        id,
        name: "Test User".to_string(),
        email: format!("user-{}@anpd.gov.br", id.0.simple()),
        profile_id,
        api_key_hash: format!("hash-{}", id.0.simple()),
        active: true,
        last_seen_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
