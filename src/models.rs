use crate::gesture::PressTicket;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Labels recorded for one day. Empty means unset.
pub type DayStatuses = Vec<String>;

/// A calendar month, canonically written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthId {
    year: i32,
    month: u32,
}

impl MonthId {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (0..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthParseError(pub String);

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid month {:?}, expected YYYY-MM", self.0)
    }
}

impl std::error::Error for MonthParseError {}

impl FromStr for MonthId {
    type Err = MonthParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || MonthParseError(value.to_string());
        let bytes = value.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(invalid());
        }

        let year = value[..4].parse().map_err(|_| invalid())?;
        let month = value[5..].parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Ordered catalog of attendance labels. Index 0 is the unset sentinel (empty string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusListError {
    Empty,
    Blank,
    Duplicate(String),
}

impl fmt::Display for StatusListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "at least one status label is required"),
            Self::Blank => write!(f, "status labels must not be blank"),
            Self::Duplicate(label) => write!(f, "status label {label:?} is listed twice"),
        }
    }
}

impl std::error::Error for StatusListError {}

impl StatusList {
    pub const UNSET: &'static str = "";

    pub fn new<I, S>(labels: I) -> Result<Self, StatusListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = vec![Self::UNSET.to_string()];
        for label in labels {
            let label = label.into().trim().to_string();
            if label.is_empty() {
                return Err(StatusListError::Blank);
            }
            if entries.contains(&label) {
                return Err(StatusListError::Duplicate(label));
            }
            entries.push(label);
        }
        if entries.len() < 2 {
            return Err(StatusListError::Empty);
        }
        Ok(Self { entries })
    }

    /// Number of entries including the unset sentinel.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the unset sentinel is present in every list.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &str {
        &self.entries[index % self.entries.len()]
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry == label)
    }

    /// The labels offered by the editor, sentinel excluded.
    pub fn selectable(&self) -> &[String] {
        &self.entries[1..]
    }

    pub fn is_selectable(&self, label: &str) -> bool {
        self.selectable().iter().any(|entry| entry == label)
    }
}

impl Default for StatusList {
    fn default() -> Self {
        Self {
            entries: ["", "practice", "round", "caddy"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Day number to recorded labels. Only touched days have keys; a missing key reads as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthStatuses {
    days: BTreeMap<u32, DayStatuses>,
}

impl MonthStatuses {
    pub fn get(&self, day: u32) -> &[String] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, day: u32, statuses: DayStatuses) {
        self.days.insert(day, statuses);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.days.iter().map(|(day, statuses)| (*day, statuses.as_slice()))
    }

    pub fn touched_days(&self) -> usize {
        self.days.len()
    }
}

impl<const N: usize> From<[(u32, DayStatuses); N]> for MonthStatuses {
    fn from(entries: [(u32, DayStatuses); N]) -> Self {
        Self {
            days: BTreeMap::from(entries),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
}

/// User-facing message attached to a successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct DayRequest {
    pub day: u32,
}

/// A touch event on a day cell. `press` is the client's id for the touch.
#[derive(Debug, Deserialize)]
pub struct PressRequest {
    pub press: PressTicket,
    pub day: u32,
}

#[derive(Debug, Deserialize)]
pub struct PressMoveRequest {
    pub press: PressTicket,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub status: String,
}

/// Query parameters accepted by the page.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(alias = "部員名")]
    pub name: Option<String>,
    #[serde(alias = "対象月")]
    pub month: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayCell {
    pub day: u32,
    pub statuses: DayStatuses,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditorView {
    pub day: u32,
    pub choices: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarView {
    pub member: String,
    pub month: String,
    pub generated: bool,
    pub days_in_month: u32,
    pub first_weekday: u32,
    pub days: Vec<DayCell>,
    pub total_count: u32,
    pub days_attended: u32,
    pub status_counts: Vec<StatusCount>,
    pub editor: Option<EditorView>,
    pub statuses: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub calendar: CalendarView,
    pub notice: Notice,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub notice: Notice,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PressStartResponse {
    pub long_press: bool,
    pub calendar: CalendarView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PressEndResponse {
    pub gesture: String,
    pub calendar: CalendarView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_id_parses_canonical_form() {
        let month: MonthId = "2024-02".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 2);
        assert_eq!(month.to_string(), "2024-02");
    }

    #[test]
    fn month_id_rejects_malformed_input() {
        for raw in ["2024-2", "24-02", "2024/02", "2024-13", "2024-00", "abcd-ef", "2024-02-01", ""] {
            assert!(raw.parse::<MonthId>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn status_list_keeps_sentinel_first() {
        let list = StatusList::new(["practice", "round"]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.entry(0), StatusList::UNSET);
        assert_eq!(list.selectable(), ["practice", "round"]);
        assert!(!list.is_selectable(""));
        assert!(!list.is_empty());
    }

    #[test]
    fn status_list_rejects_bad_labels() {
        assert!(!StatusList::default().is_empty());
        assert_eq!(StatusList::new(Vec::<String>::new()), Err(StatusListError::Empty));
        assert_eq!(StatusList::new(["practice", " "]), Err(StatusListError::Blank));
        assert_eq!(
            StatusList::new(["round", "round"]),
            Err(StatusListError::Duplicate("round".to_string()))
        );
    }

    #[test]
    fn month_statuses_serialize_with_string_keys() {
        let days = MonthStatuses::from([(3, vec!["round".to_string()]), (7, vec![])]);
        let encoded = serde_json::to_string(&days).unwrap();
        assert_eq!(encoded, r#"{"3":["round"],"7":[]}"#);
        assert!(days.get(12).is_empty());
    }
}
