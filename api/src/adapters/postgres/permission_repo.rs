//! PostgreSQL adapter for PermissionRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Action, NewPermission, Permission, PermissionId, ProfileId, Resource,
};
use crate::domain::ports::PermissionRepository;
use crate::entity::permissions;
use crate::error::DomainError;

/// PostgreSQL implementation of PermissionRepository
pub struct PostgresPermissionRepository {
    db: DatabaseConnection,
}

impl PostgresPermissionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn insert_on<C: ConnectionTrait>(
    conn: &C,
    permission: &NewPermission,
) -> Result<permissions::Model, DomainError> {
    let model = permissions::ActiveModel {
        id: Set(Uuid::new_v4()),
        profile_id: Set(permission.profile_id.0),
        action: Set(permission.action.to_string()),
        resource: Set(permission.resource.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    };

    Ok(model.insert(conn).await?)
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_by_id(&self, id: &PermissionId) -> Result<Option<Permission>, DomainError> {
        let result = permissions::Entity::find_by_id(id.0).one(&self.db).await?;

        result.map(Permission::try_from).transpose()
    }

    async fn list_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Permission>, DomainError> {
        let results = permissions::Entity::find()
            .filter(permissions::Column::ProfileId.eq(profile_id.0))
            .order_by_asc(permissions::Column::Resource)
            .order_by_asc(permissions::Column::Action)
            .all(&self.db)
            .await?;

        results.into_iter().map(Permission::try_from).collect()
    }

    async fn create(&self, permission: &NewPermission) -> Result<Permission, DomainError> {
        insert_on(&self.db, permission).await?.try_into()
    }

    async fn delete(&self, id: &PermissionId) -> Result<(), DomainError> {
        let result = permissions::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!(
                "Permission {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn replace_for_profile(
        &self,
        profile_id: &ProfileId,
        permissions: &[NewPermission],
    ) -> Result<Vec<Permission>, DomainError> {
        let txn = self.db.begin().await?;

        permissions::Entity::delete_many()
            .filter(permissions::Column::ProfileId.eq(profile_id.0))
            .exec(&txn)
            .await?;

        let mut created = Vec::with_capacity(permissions.len());
        for permission in permissions {
            created.push(insert_on(&txn, permission).await?.try_into()?);
        }

        txn.commit().await?;

        Ok(created)
    }
}

/// Convert SeaORM model to domain entity.
///
/// Fallible: action and resource are stored as text.
impl TryFrom<permissions::Model> for Permission {
    type Error = DomainError;

    fn try_from(model: permissions::Model) -> Result<Self, Self::Error> {
        let action: Action = model.action.parse().map_err(DomainError::Internal)?;
        let resource: Resource = model.resource.parse().map_err(DomainError::Internal)?;

        Ok(Permission {
            id: PermissionId(model.id),
            profile_id: ProfileId(model.profile_id),
            action,
            resource,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
