//! Audit service
//!
//! Records write operations. Recording never fails the request that
//! triggered it: entries are written on a spawned task and errors are logged.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::domain::entities::{
    AuditAction, AuditFilter, AuditLog, NewAuditLog, Resource, UserId,
};
use crate::domain::ports::AuditLogRepository;
use crate::error::AppError;

pub struct AuditService {
    logs: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    pub fn new(logs: Arc<dyn AuditLogRepository>) -> Self {
        Self { logs }
    }

    /// Record an entry in the background
    ///
    /// The handle is only awaited by tests.
    pub fn record(
        &self,
        user_id: Option<UserId>,
        action: AuditAction,
        resource: Resource,
        resource_id: Option<String>,
        details: Option<Value>,
    ) -> JoinHandle<()> {
        let logs = self.logs.clone();
        let entry = NewAuditLog {
            user_id,
            action,
            resource,
            resource_id,
            details,
        };

        tokio::spawn(async move {
            if let Err(e) = logs.create(&entry).await {
                tracing::warn!(
                    error = %e,
                    action = %entry.action,
                    resource = %entry.resource,
                    "Failed to record audit entry"
                );
            }
        })
    }

    pub async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, AppError> {
        Ok(self.logs.list(filter).await?)
    }
}
