//! PostgreSQL adapter for AuditLogRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    AuditAction, AuditFilter, AuditLog, AuditLogId, NewAuditLog, Resource, UserId,
};
use crate::domain::ports::AuditLogRepository;
use crate::entity::audit_logs;
use crate::error::DomainError;

/// PostgreSQL implementation of AuditLogRepository
pub struct PostgresAuditLogRepository {
    db: DatabaseConnection,
}

impl PostgresAuditLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn create(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError> {
        let model = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id.map(|id| id.0)),
            action: Set(entry.action.to_string()),
            resource: Set(entry.resource.to_string()),
            resource_id: Set(entry.resource_id.clone()),
            details: Set(entry.details.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        model.insert(&self.db).await?.try_into()
    }

    async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, DomainError> {
        let mut query = audit_logs::Entity::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(audit_logs::Column::UserId.eq(user_id.0));
        }
        if let Some(resource) = filter.resource {
            query = query.filter(audit_logs::Column::Resource.eq(resource.to_string()));
        }

        let results = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .offset(filter.offset as u64)
            .limit(filter.limit as u64)
            .all(&self.db)
            .await?;

        results.into_iter().map(AuditLog::try_from).collect()
    }
}

impl TryFrom<audit_logs::Model> for AuditLog {
    type Error = DomainError;

    fn try_from(model: audit_logs::Model) -> Result<Self, Self::Error> {
        let action: AuditAction = model.action.parse().map_err(DomainError::Internal)?;
        let resource: Resource = model.resource.parse().map_err(DomainError::Internal)?;

        Ok(AuditLog {
            id: AuditLogId(model.id),
            user_id: model.user_id.map(UserId),
            action,
            resource,
            resource_id: model.resource_id,
            details: model.details,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
