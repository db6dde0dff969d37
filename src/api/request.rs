/// Request descriptions exchanged between the gallery session and the API client
///
/// The session never performs I/O itself: it returns [`Fetch`] values and is
/// later handed the matching [`Payload`]. Every fetch carries a [`Ticket`] so
/// that a response from a superseded request can be recognised and dropped.

use std::sync::Arc;

use crate::error::FetchError;
use crate::state::data::{Facet, Photo};

/// Logical query slots. At most one response per slot is ever accepted: the
/// one belonging to the most recently issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    YearOptions,
    EventOptions,
    DayOptions,
    TeamMiscOptions,
    Photos,
    Similar,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::YearOptions,
        Slot::EventOptions,
        Slot::DayOptions,
        Slot::TeamMiscOptions,
        Slot::Photos,
        Slot::Similar,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Facets whose options a filter-options response for this slot may overwrite
    pub fn option_targets(self) -> &'static [Facet] {
        match self {
            Slot::YearOptions => &[Facet::Year],
            Slot::EventOptions => &[Facet::Event],
            Slot::DayOptions => &[Facet::Day],
            Slot::TeamMiscOptions => &[Facet::Team, Facet::Misc],
            Slot::Photos | Slot::Similar => &[],
        }
    }
}

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub seq: u64,
}

/// Monotonic sequence numbers, one counter per slot
#[derive(Debug, Clone, Default)]
pub struct TicketBook {
    latest: [u64; 6],
}

impl TicketBook {
    /// Issue a new ticket for `slot`, superseding every earlier one
    pub fn issue(&mut self, slot: Slot) -> Ticket {
        self.latest[slot.index()] += 1;
        Ticket {
            slot,
            seq: self.latest[slot.index()],
        }
    }

    /// Supersede any in-flight request for `slot` without issuing a new one
    pub fn invalidate(&mut self, slot: Slot) {
        self.latest[slot.index()] += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest[ticket.slot.index()] == ticket.seq
    }
}

/// What to ask the remote API for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Filter-options service, scoped by the given upstream selections
    FilterOptions(Vec<(Facet, String)>),
    /// Photo-search service with every selected value
    Photos(Vec<(Facet, String)>),
    /// Similarity service: neighbours of photo `id`
    Similar { id: String, limit: usize },
}

/// A request the session wants issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub ticket: Ticket,
    pub query: Query,
}

/// Option lists returned by the filter-options service.
///
/// Any subset of facets may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    values: [Option<Vec<String>>; 5],
}

impl FilterOptions {
    pub fn get(&self, facet: Facet) -> Option<&[String]> {
        self.values[facet as usize].as_deref()
    }

    pub fn insert(&mut self, facet: Facet, values: Vec<String>) {
        self.values[facet as usize] = Some(values);
    }

    pub fn with(mut self, facet: Facet, values: &[&str]) -> Self {
        self.insert(facet, values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// A decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Options(FilterOptions),
    Photos(Vec<Photo>),
}

impl Payload {
    /// The empty result of the kind a request in `slot` produces
    pub fn empty_for(slot: Slot) -> Self {
        match slot {
            Slot::Photos | Slot::Similar => Payload::Photos(Vec::new()),
            _ => Payload::Options(FilterOptions::default()),
        }
    }
}

/// Result of executing a [`Fetch`], cheap to clone into UI messages
pub type FetchOutcome = Result<Payload, Arc<FetchError>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut book = TicketBook::default();
        let first = book.issue(Slot::Photos);
        let second = book.issue(Slot::Photos);

        assert!(!book.is_current(first));
        assert!(book.is_current(second));
    }

    #[test]
    fn test_slots_are_independent() {
        let mut book = TicketBook::default();
        let photos = book.issue(Slot::Photos);
        book.issue(Slot::DayOptions);
        assert!(book.is_current(photos));
    }

    #[test]
    fn test_invalidate_drops_in_flight() {
        let mut book = TicketBook::default();
        let ticket = book.issue(Slot::Similar);
        book.invalidate(Slot::Similar);
        assert!(!book.is_current(ticket));
    }
}
