//! Dashboard service
//!
//! Aggregates the process table into the numbers shown on the dashboard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::domain::entities::{
    CountBucket, DashboardSummary, LookupKind, MonthBucket, ReportRow, UNASSIGNED_LABEL,
};
use crate::domain::ports::{LookupRepository, ProcessRepository, ResponsibleRepository};
use crate::error::AppError;

pub struct DashboardService {
    processes: Arc<dyn ProcessRepository>,
    lookups: Arc<dyn LookupRepository>,
    responsibles: Arc<dyn ResponsibleRepository>,
}

impl DashboardService {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        lookups: Arc<dyn LookupRepository>,
        responsibles: Arc<dyn ResponsibleRepository>,
    ) -> Self {
        Self {
            processes,
            lookups,
            responsibles,
        }
    }

    /// Summary over all processes; monthly counts cover `year` (default: current year)
    ///
    /// Groupings and monthly counts only include active processes.
    pub async fn summary(&self, year: Option<i32>) -> Result<DashboardSummary, AppError> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let rows = self.processes.report_rows().await?;

        let situations = self.lookup_names(LookupKind::Situation).await?;
        let channels = self.lookup_names(LookupKind::EntryChannel).await?;
        let responsibles: HashMap<String, String> = self
            .responsibles
            .list(true)
            .await?
            .into_iter()
            .map(|r| (r.id.to_string(), r.name))
            .collect();

        let active: Vec<&ReportRow> = rows.iter().filter(|r| r.active).collect();

        Ok(DashboardSummary {
            year,
            total: rows.len() as u64,
            active: active.len() as u64,
            open: active.iter().filter(|r| r.closed_at.is_none()).count() as u64,
            closed: active.iter().filter(|r| r.closed_at.is_some()).count() as u64,
            by_situation: group(
                &active,
                |r| r.situation_id.map(|id| id.to_string()),
                &situations,
            ),
            by_entry_channel: group(
                &active,
                |r| r.entry_channel_id.map(|id| id.to_string()),
                &channels,
            ),
            by_responsible: group(
                &active,
                |r| r.responsible_id.map(|id| id.to_string()),
                &responsibles,
            ),
            received_by_month: by_month(&active, year),
        })
    }

    async fn lookup_names(&self, kind: LookupKind) -> Result<HashMap<String, String>, AppError> {
        Ok(self
            .lookups
            .list(kind, true)
            .await?
            .into_iter()
            .map(|l| (l.id.to_string(), l.name))
            .collect())
    }
}

/// Count rows per key, largest bucket first
fn group(
    rows: &[&ReportRow],
    key: impl Fn(&ReportRow) -> Option<String>,
    labels: &HashMap<String, String>,
) -> Vec<CountBucket> {
    let mut counts: HashMap<Option<String>, u64> = HashMap::new();
    for row in rows {
        *counts.entry(key(*row)).or_default() += 1;
    }

    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(id, count)| {
            let label = match &id {
                Some(id) => labels.get(id).cloned().unwrap_or_else(|| id.clone()),
                None => UNASSIGNED_LABEL.to_string(),
            };
            CountBucket { id, label, count }
        })
        .collect();

    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

fn by_month(rows: &[&ReportRow], year: i32) -> Vec<MonthBucket> {
    let mut months: Vec<MonthBucket> = (1..=12)
        .map(|month| MonthBucket { month, count: 0 })
        .collect();

    for date in rows.iter().filter_map(|r| r.received_at) {
        if date.year() == year {
            months[date.month0() as usize].count += 1;
        }
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::test_utils::{
        test_lookup, test_process, test_responsible, InMemoryLookupRepository,
        InMemoryProcessRepository, InMemoryResponsibleRepository,
    };

    #[tokio::test]
    async fn summary_counts_and_groups() {
        let analysis = test_lookup(LookupKind::Situation, "Em análise");
        let maria = test_responsible("Maria");

        let mut p1 = test_process("1");
        p1.situation_id = Some(analysis.id);
        p1.responsible_id = Some(maria.id);
        p1.received_at = NaiveDate::from_ymd_opt(2024, 1, 15);

        let mut p2 = test_process("2");
        p2.situation_id = Some(analysis.id);
        p2.received_at = NaiveDate::from_ymd_opt(2024, 1, 20);
        p2.closed_at = NaiveDate::from_ymd_opt(2024, 2, 1);

        let mut p3 = test_process("3");
        p3.received_at = NaiveDate::from_ymd_opt(2023, 12, 1);

        let mut p4 = test_process("4");
        p4.active = false;
        p4.received_at = NaiveDate::from_ymd_opt(2024, 3, 1);

        let service = DashboardService::new(
            Arc::new(
                InMemoryProcessRepository::new()
                    .with_process(p1)
                    .with_process(p2)
                    .with_process(p3)
                    .with_process(p4),
            ),
            Arc::new(InMemoryLookupRepository::new().with_lookup(analysis.clone())),
            Arc::new(InMemoryResponsibleRepository::new().with_responsible(maria.clone())),
        );

        let summary = service.summary(Some(2024)).await.unwrap();

        assert_eq!(summary.year, 2024);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active, 3);
        assert_eq!(summary.open, 2);
        assert_eq!(summary.closed, 1);

        assert_eq!(summary.by_situation.len(), 2);
        assert_eq!(summary.by_situation[0].label, "Em análise");
        assert_eq!(summary.by_situation[0].count, 2);
        assert_eq!(summary.by_situation[1].label, UNASSIGNED_LABEL);
        assert_eq!(summary.by_situation[1].id, None);

        let maria_bucket = summary
            .by_responsible
            .iter()
            .find(|b| b.label == "Maria")
            .unwrap();
        assert_eq!(maria_bucket.count, 1);

        assert_eq!(summary.by_entry_channel.len(), 1);
        assert_eq!(summary.by_entry_channel[0].count, 3);

        assert_eq!(summary.received_by_month.len(), 12);
        assert_eq!(summary.received_by_month[0].count, 2);
        assert_eq!(summary.received_by_month[2].count, 0);
        assert_eq!(summary.received_by_month[11].count, 0);
    }

    #[tokio::test]
    async fn empty_summary_has_twelve_months() {
        let service = DashboardService::new(
            Arc::new(InMemoryProcessRepository::new()),
            Arc::new(InMemoryLookupRepository::new()),
            Arc::new(InMemoryResponsibleRepository::new()),
        );

        let summary = service.summary(None).await.unwrap();

        assert_eq!(summary.total, 0);
        assert!(summary.by_situation.is_empty());
        assert_eq!(summary.received_by_month.len(), 12);
        assert!(summary.received_by_month.iter().all(|m| m.count == 0));
        assert_eq!(summary.year, Utc::now().year());
    }
}
