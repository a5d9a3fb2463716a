use serde::Deserialize;
use std::time::Duration;

/// How long a touch has to be held before it opens the editor.
pub const LONG_PRESS: Duration = Duration::from_millis(500);

/// Identifies one touch. Chosen by the client and increasing, so start, move and end can
/// be matched even when their requests arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PressTicket(pub u64);

/// How a touch resolved once it was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEnd {
    /// Released before the long-press delay: a plain tap on the day.
    Tap(u32),
    /// The long press already fired, so the release must not count as a tap.
    Suppressed(u32),
    /// The touch moved, or the event belongs to a press that is already over.
    Ignored,
}

impl PressEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tap(_) => "tap",
            Self::Suppressed(_) => "suppressed",
            Self::Ignored => "ignored",
        }
    }
}

#[derive(Debug)]
struct Pending {
    ticket: PressTicket,
    day: u32,
    fired: bool,
}

/// Tracks the single outstanding touch. The timer itself lives with the caller, which reports
/// back through `fire` with the ticket it armed.
#[derive(Debug, Default)]
pub struct PressTracker {
    pending: Option<Pending>,
    closed: Option<PressTicket>,
}

impl PressTracker {
    /// Arm `ticket`, replacing any earlier press. Returns `false` when that press was already
    /// released or moved, or a newer one is armed, in which case nothing changes.
    pub fn start(&mut self, ticket: PressTicket, day: u32) -> bool {
        let newer_armed = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket > ticket);
        if newer_armed || self.is_closed(ticket) {
            return false;
        }
        self.pending = Some(Pending {
            ticket,
            day,
            fired: false,
        });
        true
    }

    /// The timer for `ticket` elapsed. Returns the day when the press is still held.
    pub fn fire(&mut self, ticket: PressTicket) -> Option<u32> {
        match self.pending.as_mut() {
            Some(pending) if pending.ticket == ticket && !pending.fired => {
                pending.fired = true;
                Some(pending.day)
            }
            _ => None,
        }
    }

    /// The finger moved: drop the gesture entirely.
    pub fn moved(&mut self, ticket: PressTicket) -> bool {
        if self.is_closed(ticket) {
            return false;
        }
        self.close(ticket);
        self.pending
            .take_if(|pending| pending.ticket <= ticket)
            .is_some_and(|pending| pending.ticket == ticket)
    }

    /// The finger lifted off `day`. A release seen before its start still counts as a tap.
    pub fn end(&mut self, ticket: PressTicket, day: u32) -> PressEnd {
        if self.is_closed(ticket) {
            return PressEnd::Ignored;
        }
        self.close(ticket);
        match self.pending.take_if(|pending| pending.ticket <= ticket) {
            Some(pending) if pending.ticket == ticket => {
                if pending.fired {
                    PressEnd::Suppressed(pending.day)
                } else {
                    PressEnd::Tap(pending.day)
                }
            }
            // Start not seen yet, or already replaced by a newer press.
            _ => PressEnd::Tap(day),
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    fn is_closed(&self, ticket: PressTicket) -> bool {
        self.closed.is_some_and(|closed| ticket <= closed)
    }

    fn close(&mut self, ticket: PressTicket) {
        self.closed = Some(self.closed.map_or(ticket, |closed| closed.max(ticket)));
    }
}
