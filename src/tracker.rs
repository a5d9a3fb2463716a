//! Page-level controller: owns the month status map and applies every user action to it.

use crate::calendar::MonthGrid;
use crate::gesture::{LONG_PRESS, PressEnd, PressTicket, PressTracker};
use crate::models::{
    CalendarView, DayCell, EditorView, MonthId, MonthStatuses, Notice, StatusList,
};
use crate::remote::{LoadResponse, RemoteStore, SavePayload, SyncError};
use crate::stats::{Tally, build_tally};
use crate::status::{StatusEditor, TapOutcome, cycle};
use std::fmt;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum TrackerError {
    MissingName,
    MissingMonth,
    InvalidMonth(String),
    NotGenerated,
    OtherMember(String),
    DayOutOfRange(u32),
    UnknownStatus(String),
    NoEditor,
    EditorUnavailable,
    Superseded,
    Sync(SyncError),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "enter a member name"),
            Self::MissingMonth => write!(f, "choose a target month"),
            Self::InvalidMonth(raw) => write!(f, "month {raw:?} is not in YYYY-MM form"),
            Self::NotGenerated => write!(f, "generate the calendar first"),
            Self::OtherMember(member) => {
                write!(f, "the calendar on screen belongs to {member:?}; generate it again")
            }
            Self::DayOutOfRange(day) => write!(f, "day {day} is not in this month"),
            Self::UnknownStatus(status) => write!(f, "unknown status {status:?}"),
            Self::NoEditor => write!(f, "no day is being edited"),
            Self::EditorUnavailable => write!(f, "multi-status editing is disabled"),
            Self::Superseded => write!(f, "a newer calendar was requested meanwhile"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

/// Handed out when a load starts; the result is only applied if no newer load began.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    seq: u64,
    grid: MonthGrid,
    member: String,
}

impl LoadTicket {
    pub fn month(&self) -> MonthId {
        self.grid.month()
    }

    pub fn member(&self) -> &str {
        &self.member
    }
}

#[derive(Debug)]
pub struct Tracker {
    statuses: StatusList,
    multi_select: bool,
    member: String,
    month: MonthId,
    grid: Option<MonthGrid>,
    days: MonthStatuses,
    editor: Option<StatusEditor>,
    press: PressTracker,
    load_seq: u64,
}

impl Tracker {
    pub fn new(statuses: StatusList, multi_select: bool) -> Self {
        Self {
            statuses,
            multi_select,
            member: String::new(),
            month: MonthId::current(),
            grid: None,
            days: MonthStatuses::default(),
            editor: None,
            press: PressTracker::default(),
            load_seq: 0,
        }
    }

    pub fn days(&self) -> &MonthStatuses {
        &self.days
    }

    pub fn tally(&self) -> Tally {
        build_tally(&self.days, &self.statuses)
    }

    pub fn editor(&self) -> Option<&StatusEditor> {
        self.editor.as_ref()
    }

    /// Validate the form, lay out the new month and discard the previous one.
    pub fn begin_generate(&mut self, name: &str, month: &str) -> Result<LoadTicket, TrackerError> {
        let (member, month) = validate_form(name, month)?;
        let grid = MonthGrid::new(month);

        self.member = member;
        self.month = month;
        self.grid = Some(grid);
        self.days = MonthStatuses::default();
        self.editor = None;
        self.press.reset();
        self.load_seq += 1;

        Ok(LoadTicket {
            seq: self.load_seq,
            grid,
            member: self.member.clone(),
        })
    }

    /// Apply the outcome of a remote load. Failures leave the month empty.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        response: Result<LoadResponse, SyncError>,
    ) -> Result<Notice, TrackerError> {
        if ticket.seq != self.load_seq {
            warn!(month = %ticket.month(), "discarding superseded load");
            return Err(TrackerError::Superseded);
        }

        match response.and_then(|response| response.into_month(&ticket.grid, &self.statuses)) {
            Ok(Some(days)) => {
                info!(month = %ticket.month(), days = days.touched_days(), "loaded existing month");
                self.days = days;
                Ok(Notice::success("Loaded existing data."))
            }
            Ok(None) => {
                self.days = MonthStatuses::default();
                Ok(Notice::info("No data yet. Starting a new month."))
            }
            Err(err) => {
                warn!(month = %ticket.month(), "load failed: {err}");
                self.days = MonthStatuses::default();
                Err(TrackerError::Sync(err))
            }
        }
    }

    /// Build the write for the generated month. The map stays as it is whatever the remote does.
    pub fn save_payload(&self, name: &str, month: &str) -> Result<SavePayload, TrackerError> {
        if name.trim().is_empty() {
            return Err(TrackerError::MissingName);
        }
        if month.trim().is_empty() {
            return Err(TrackerError::MissingMonth);
        }
        let grid = self.grid.ok_or(TrackerError::NotGenerated)?;
        let (member, month) = validate_form(name, month)?;
        if grid.month() != month {
            return Err(TrackerError::NotGenerated);
        }
        if member != self.member {
            return Err(TrackerError::OtherMember(self.member.clone()));
        }

        SavePayload::new(month, &member, &self.days, &self.tally()).map_err(TrackerError::Sync)
    }

    pub fn tap(&mut self, day: u32) -> Result<(), TrackerError> {
        self.check_day(day)?;
        match cycle(self.days.get(day), &self.statuses, self.multi_select) {
            TapOutcome::Updated(next) => {
                debug!(day, statuses = ?next, "day cycled");
                self.days.set(day, next);
            }
            TapOutcome::OpenEditor => self.open_editor(day)?,
        }
        Ok(())
    }

    pub fn open_editor(&mut self, day: u32) -> Result<(), TrackerError> {
        if !self.multi_select {
            return Err(TrackerError::EditorUnavailable);
        }
        self.check_day(day)?;
        self.editor = Some(StatusEditor::open(day, self.days.get(day), &self.statuses));
        Ok(())
    }

    pub fn toggle_editor(&mut self, status: &str) -> Result<bool, TrackerError> {
        let editor = self.editor.as_mut().ok_or(TrackerError::NoEditor)?;
        editor
            .toggle(status)
            .ok_or_else(|| TrackerError::UnknownStatus(status.to_string()))
    }

    pub fn save_editor(&mut self) -> Result<(), TrackerError> {
        let editor = self.editor.take().ok_or(TrackerError::NoEditor)?;
        let (day, statuses) = editor.save();
        self.check_day(day)?;
        debug!(day, statuses = ?statuses, "editor saved");
        self.days.set(day, statuses);
        Ok(())
    }

    pub fn cancel_editor(&mut self) {
        self.editor = None;
    }

    /// Returns whether the press was armed; a press already released or moved is not.
    pub fn press_start(&mut self, ticket: PressTicket, day: u32) -> Result<bool, TrackerError> {
        self.check_day(day)?;
        Ok(self.press.start(ticket, day))
    }

    /// Long-press delay elapsed for `ticket`. Returns whether the editor opened.
    ///
    /// Without the editor the press is left unfired, so its release still counts as a tap.
    pub fn press_fire(&mut self, ticket: PressTicket) -> bool {
        if !self.multi_select {
            return false;
        }
        let Some(day) = self.press.fire(ticket) else {
            return false;
        };
        debug!(day, "long press");
        self.open_editor(day).is_ok()
    }

    pub fn press_move(&mut self, ticket: PressTicket) {
        if self.press.moved(ticket) {
            debug!(press = ticket.0, "press cancelled by movement");
        }
    }

    pub fn press_end(&mut self, ticket: PressTicket, day: u32) -> Result<PressEnd, TrackerError> {
        self.check_day(day)?;
        let end = self.press.end(ticket, day);
        if let PressEnd::Tap(day) = end {
            self.tap(day)?;
        }
        Ok(end)
    }

    pub fn view(&self) -> CalendarView {
        let tally = self.tally();
        let (days_in_month, first_weekday, days) = match &self.grid {
            Some(grid) => (
                grid.days_in_month(),
                grid.first_weekday(),
                grid.days()
                    .map(|day| DayCell {
                        day,
                        statuses: self.days.get(day).to_vec(),
                    })
                    .collect(),
            ),
            None => (0, 0, Vec::new()),
        };

        CalendarView {
            member: self.member.clone(),
            month: self.month.to_string(),
            generated: self.grid.is_some(),
            days_in_month,
            first_weekday,
            days,
            total_count: tally.total,
            days_attended: tally.days_attended,
            status_counts: tally.status_counts(),
            editor: self.editor.as_ref().map(|editor| EditorView {
                day: editor.day(),
                choices: editor.choices().to_vec(),
                selected: editor.selected().to_vec(),
            }),
            statuses: self.statuses.selectable().to_vec(),
        }
    }

    fn check_day(&self, day: u32) -> Result<(), TrackerError> {
        let grid = self.grid.as_ref().ok_or(TrackerError::NotGenerated)?;
        if grid.contains(day) {
            Ok(())
        } else {
            Err(TrackerError::DayOutOfRange(day))
        }
    }
}

fn validate_form(name: &str, month: &str) -> Result<(String, MonthId), TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::MissingName);
    }
    let month = month.trim();
    if month.is_empty() {
        return Err(TrackerError::MissingMonth);
    }
    let month = month
        .parse()
        .map_err(|_| TrackerError::InvalidMonth(month.to_string()))?;
    Ok((name.to_string(), month))
}

/// Generate the calendar and fill it from the remote store. The lock is released while the
/// request is in flight.
pub async fn generate<R: RemoteStore>(
    tracker: &Mutex<Tracker>,
    remote: &R,
    name: &str,
    month: &str,
) -> Result<Notice, TrackerError> {
    let ticket = tracker.lock().await.begin_generate(name, month)?;
    let response = remote.load(ticket.month(), ticket.member()).await;
    tracker.lock().await.finish_load(ticket, response)
}

/// Send a snapshot of the month. Edits made while the request is in flight go out with the next save.
pub async fn submit<R: RemoteStore>(
    tracker: &Mutex<Tracker>,
    remote: &R,
    name: &str,
    month: &str,
) -> Result<Notice, TrackerError> {
    let payload = tracker.lock().await.save_payload(name, month)?;
    remote.save(&payload).await.map_err(|err| {
        warn!(month = %payload.month, "save failed: {err}");
        TrackerError::Sync(err)
    })?;
    Ok(Notice::success("Monthly data sent."))
}

/// Hold touch `ticket` on `day` for the long-press delay. Returns whether the editor opened.
pub async fn hold(
    tracker: &Mutex<Tracker>,
    ticket: PressTicket,
    day: u32,
) -> Result<bool, TrackerError> {
    if !tracker.lock().await.press_start(ticket, day)? {
        return Ok(false);
    }
    sleep(LONG_PRESS).await;
    Ok(tracker.lock().await.press_fire(ticket))
}
