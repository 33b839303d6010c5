use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::dashboard::snapshot_store::{SnapshotError, SnapshotStore};
use crate::dashboard::{DashboardEntry, EntryId};
use crate::model::StatusLabel;
use crate::utils::calendar::{DateSpan, build_day_index};

/// Fixed entries the calendar shows before any snapshot arrives.
pub fn base_entries() -> Vec<DashboardEntry> {
    let entry = |id: &str, employee: &str, role: &str, kind: &str, status, start: (u32, u32), end: (u32, u32)| {
        let day = |(m, d): (u32, u32)| NaiveDate::from_ymd_opt(2025, m, d).unwrap_or_default();
        DashboardEntry {
            id: EntryId::from(id),
            employee: employee.to_string(),
            role: role.to_string(),
            request_type: kind.to_string(),
            status,
            start_date: day(start),
            end_date: day(end),
            hours: None,
            notes: None,
            submitted: None,
            dates_label: None,
        }
    };
    use StatusLabel::{Approved, Denied, Pending};
    vec![
        entry("kayley-pto", "Kayley Manfredi", "Product Manager", "PTO", Approved, (1, 11), (1, 12)),
        entry("jordan-wfh", "Jordan Lee", "Engineering Manager", "WFH", Approved, (3, 4), (3, 8)),
        entry("priya-sick", "Priya Patel", "QA Analyst", "Sick", Approved, (5, 20), (5, 22)),
        entry("nina-pto", "Nina Chen", "Customer Success Lead", "PTO", Pending, (7, 1), (7, 5)),
        entry("omar-wfh", "Omar Hassan", "People Operations", "WFH", Denied, (9, 9), (9, 10)),
        entry("alex-fall-pto", "Alex Wilson", "Product Designer", "PTO", Approved, (10, 7), (10, 10)),
        entry("nina-autumn-pto", "Nina Chen", "Customer Success Lead", "PTO", Pending, (10, 21), (10, 24)),
        entry("omar-nov-pto", "Omar Hassan", "People Operations", "PTO", Approved, (11, 5), (11, 7)),
        entry("priya-holiday-pto", "Priya Patel", "QA Analyst", "PTO", Pending, (11, 18), (11, 21)),
        entry("sofia-pto", "Sofia Martinez", "Senior Account Executive", "PTO", Approved, (11, 24), (11, 29)),
    ]
}

/// Calendar view: base entries overlaid with the shared snapshot set.
pub struct CalendarBoard {
    base: Vec<DashboardEntry>,
    dynamic: Vec<DashboardEntry>,
    store: Arc<dyn SnapshotStore>,
    changes: watch::Receiver<u64>,
    loaded_version: Option<u64>,
}

impl CalendarBoard {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Result<Self, SnapshotError> {
        Self::with_base(base_entries(), store)
    }

    pub fn with_base(
        base: Vec<DashboardEntry>,
        store: Arc<dyn SnapshotStore>,
    ) -> Result<Self, SnapshotError> {
        let changes = store.subscribe();
        let mut board = Self {
            base,
            dynamic: Vec::new(),
            store,
            changes,
            loaded_version: None,
        };
        board.refresh()?;
        Ok(board)
    }

    /// Reload the snapshot set if its version moved. Returns whether
    /// anything was reloaded.
    pub fn refresh(&mut self) -> Result<bool, SnapshotError> {
        let latest = *self.changes.borrow_and_update();
        if self.loaded_version == Some(latest) {
            return Ok(false);
        }
        let set = self.store.load()?;
        debug!(version = set.version, count = set.snapshots.len(), "Calendar reloaded snapshots");
        self.loaded_version = Some(set.version);
        self.dynamic = set.snapshots;
        Ok(true)
    }

    /// Wait until another view publishes, then reload.
    pub async fn wait_for_change(&mut self) -> Result<(), SnapshotError> {
        self.changes
            .changed()
            .await
            .map_err(|_| SnapshotError::Closed)?;
        self.refresh()?;
        Ok(())
    }

    /// Base entries with snapshot entries taking precedence by id.
    pub fn entries(&self) -> Vec<DashboardEntry> {
        let mut merged: Vec<DashboardEntry> = self
            .base
            .iter()
            .map(|base| {
                self.dynamic
                    .iter()
                    .find(|d| d.id == base.id)
                    .unwrap_or(base)
                    .clone()
            })
            .collect();
        merged.extend(
            self.dynamic
                .iter()
                .filter(|d| !self.base.iter().any(|b| b.id == d.id))
                .cloned(),
        );
        merged
    }

    pub fn entries_for_year(&self, year: i32) -> Vec<DashboardEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.touches_year(year))
            .collect()
    }

    pub fn day_index(&self) -> BTreeMap<NaiveDate, Vec<DashboardEntry>> {
        build_day_index(&self.entries())
    }

    /// Years with at least one entry, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .entries()
            .iter()
            .flat_map(|e| [chrono::Datelike::year(&e.start_date), chrono::Datelike::year(&e.end_date)])
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Counts per status label across every entry.
    pub fn status_totals(&self) -> BTreeMap<String, usize> {
        let mut totals = BTreeMap::new();
        for label in [StatusLabel::Pending, StatusLabel::Approved, StatusLabel::Denied] {
            totals.insert(label.to_string(), 0);
        }
        for entry in self.entries() {
            *totals.entry(entry.status.to_string()).or_insert(0) += 1;
        }
        totals
    }
}
