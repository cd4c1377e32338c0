//! Dashboard reporting types

use chrono::NaiveDate;
use serde::Serialize;

use super::lookup::LookupId;
use super::responsible::ResponsibleId;

/// Label used for processes with no value in a grouped dimension
pub const UNASSIGNED_LABEL: &str = "Não informado";

/// Minimal projection of a process used for aggregation
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub situation_id: Option<LookupId>,
    pub entry_channel_id: Option<LookupId>,
    pub responsible_id: Option<ResponsibleId>,
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
    pub active: bool,
}

/// One bar of a grouped count
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountBucket {
    /// Referenced row id, `None` for the unassigned bucket
    pub id: Option<String>,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthBucket {
    /// 1..=12
    pub month: u32,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub total: u64,
    pub active: u64,
    pub open: u64,
    pub closed: u64,
    pub by_situation: Vec<CountBucket>,
    pub by_entry_channel: Vec<CountBucket>,
    pub by_responsible: Vec<CountBucket>,
    pub received_by_month: Vec<MonthBucket>,
}
