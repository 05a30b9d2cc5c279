//! Last-issued-wins supersession for asynchronous results.
//!
//! Each mutable field that an asynchronous job writes owns a
//! [`RequestSlot`]. Issuing a job bumps the slot's generation; a result
//! is applied only if it carries the latest generation. There is no
//! cancellation: superseded work runs to completion and is dropped.

use serde::{Deserialize, Serialize};

/// Which field a job's result is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// The stage preview image.
    Preview,
    /// The advisory text.
    Advisory,
}

/// Tag attached to an issued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Destination slot.
    pub slot: SlotKind,
    /// Generation at issue time.
    pub generation: u64,
}

/// Whether a resolved ticket may still write its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Latest issued ticket; apply the result.
    Fresh,
    /// Superseded or invalidated; drop the result.
    Stale,
}

/// Generation counter and busy flag for one destination field.
#[derive(Debug, Clone)]
pub struct RequestSlot {
    kind: SlotKind,
    latest: u64,
    outstanding: bool,
}

impl RequestSlot {
    /// An idle slot that has issued nothing.
    #[must_use]
    pub const fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            latest: 0,
            outstanding: false,
        }
    }

    /// Issue a new ticket, superseding every earlier one.
    pub const fn issue(&mut self) -> Ticket {
        self.latest += 1;
        self.outstanding = true;
        Ticket {
            slot: self.kind,
            generation: self.latest,
        }
    }

    /// Supersede every outstanding ticket without issuing a new one.
    pub const fn invalidate(&mut self) {
        self.latest += 1;
        self.outstanding = false;
    }

    /// Settle `ticket`.
    ///
    /// Only the latest ticket of this slot is fresh; resolving it marks
    /// the slot idle. A stale ticket leaves the slot untouched.
    pub fn resolve(&mut self, ticket: Ticket) -> Freshness {
        if ticket.slot == self.kind && ticket.generation == self.latest && self.outstanding {
            self.outstanding = false;
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    /// Whether the latest issued ticket is still unresolved.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.outstanding
    }

    /// Most recently issued or invalidated generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.latest
    }
}
