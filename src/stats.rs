use crate::models::{MonthStatuses, StatusCount, StatusList};
use std::collections::BTreeMap;

/// Participation counts derived from a month status map.
///
/// `total` is the sum of per-status counts, so a day holding two labels counts twice.
/// `days_attended` is the number of days with at least one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub per_status: Vec<(String, u32)>,
    pub total: u32,
    pub days_attended: u32,
}

impl Tally {
    pub fn count(&self, status: &str) -> u32 {
        self.per_status
            .iter()
            .find(|(label, _)| label == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn counts_by_status(&self) -> BTreeMap<&str, u32> {
        self.per_status
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect()
    }

    pub fn status_counts(&self) -> Vec<StatusCount> {
        self.per_status
            .iter()
            .map(|(status, count)| StatusCount {
                status: status.clone(),
                count: *count,
            })
            .collect()
    }
}

pub fn build_tally(days: &MonthStatuses, list: &StatusList) -> Tally {
    let mut per_status: Vec<(String, u32)> = list
        .selectable()
        .iter()
        .map(|label| (label.clone(), 0))
        .collect();
    let mut days_attended = 0u32;

    for (_, statuses) in days.iter() {
        if !statuses.is_empty() {
            days_attended = days_attended.saturating_add(1);
        }
        for (label, count) in per_status.iter_mut() {
            if statuses.contains(label) {
                *count = count.saturating_add(1);
            }
        }
    }

    let total = per_status
        .iter()
        .fold(0u32, |acc, (_, count)| acc.saturating_add(*count));

    Tally {
        per_status,
        total,
        days_attended,
    }
}
