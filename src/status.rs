use crate::models::{DayStatuses, StatusList};

/// Result of a plain tap on a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    Updated(DayStatuses),
    OpenEditor,
}

/// Advance a day's status one step around the status list.
///
/// Days holding several labels are handed to the editor when one is available. Without an
/// editor only the first label advances; labels already held by the rest of the day are
/// skipped and reaching the sentinel drops the first label.
pub fn cycle(current: &[String], list: &StatusList, editor_available: bool) -> TapOutcome {
    if current.len() >= 2 {
        if editor_available {
            return TapOutcome::OpenEditor;
        }
        return TapOutcome::Updated(advance_first(current, list));
    }

    let index = current
        .first()
        .and_then(|label| list.index_of(label))
        .unwrap_or(0);
    let next = (index + 1) % list.len();
    if next == 0 {
        TapOutcome::Updated(Vec::new())
    } else {
        TapOutcome::Updated(vec![list.entry(next).to_string()])
    }
}

fn advance_first(current: &[String], list: &StatusList) -> DayStatuses {
    let rest = &current[1..];
    let mut index = list.index_of(&current[0]).unwrap_or(0);
    loop {
        index = (index + 1) % list.len();
        let label = list.entry(index);
        if index == 0 {
            return rest.to_vec();
        }
        if !rest.iter().any(|held| held == label) {
            let mut next = Vec::with_capacity(current.len());
            next.push(label.to_string());
            next.extend_from_slice(rest);
            return next;
        }
    }
}

/// Checklist editing the labels of one day. Nothing reaches the month map until `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEditor {
    day: u32,
    choices: Vec<String>,
    selected: DayStatuses,
}

impl StatusEditor {
    pub fn open(day: u32, current: &[String], list: &StatusList) -> Self {
        let mut selected = DayStatuses::new();
        for label in current {
            if list.is_selectable(label) && !selected.contains(label) {
                selected.push(label.clone());
            }
        }
        Self {
            day,
            choices: list.selectable().to_vec(),
            selected,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Flip one label. Returns whether it is now selected, or `None` for a label that is not offered.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        if !self.choices.iter().any(|choice| choice == label) {
            return None;
        }
        if let Some(position) = self.selected.iter().position(|held| held == label) {
            self.selected.remove(position);
            Some(false)
        } else {
            self.selected.push(label.to_string());
            Some(true)
        }
    }

    pub fn save(self) -> (u32, DayStatuses) {
        (self.day, self.selected)
    }
}
