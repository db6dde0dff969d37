/// Facet filter store
///
/// Holds the active selections and the offered options for the five facets,
/// and encodes the cascade as an explicit dependency graph. Mutations report
/// which facets changed; the caller walks [`Edge::triggered_by`] to decide
/// what to recompute.

use tracing::debug;

use super::data::{normalize_options, Facet, FacetOptionSet, FacetSelectionSet};
use crate::api::request::Slot;

/// Selections cleared as part of the same update when `facet` is toggled.
///
/// Year resets everything below it; Team and Misc are mutually exclusive.
/// No other facet clears its downstream on toggle.
pub fn cleared_by_toggle(facet: Facet) -> &'static [Facet] {
    match facet {
        Facet::Year => &[Facet::Event, Facet::Day, Facet::Team, Facet::Misc],
        Facet::Team => &[Facet::Misc],
        Facet::Misc => &[Facet::Team],
        Facet::Event | Facet::Day => &[],
    }
}

/// One edge of the option dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Year selection → Event options
    YearToEvent,
    /// Event selection → Day options
    EventToDay,
    /// (Event, Day) selection → Team and Misc options, recomputed together
    EventDayToTeamMisc,
}

impl Edge {
    /// Edges in downstream order
    pub const ALL: [Edge; 3] = [Edge::YearToEvent, Edge::EventToDay, Edge::EventDayToTeamMisc];

    /// Facets whose selection change re-runs this edge
    pub fn triggers(self) -> &'static [Facet] {
        match self {
            Edge::YearToEvent => &[Facet::Year],
            Edge::EventToDay => &[Facet::Event],
            Edge::EventDayToTeamMisc => &[Facet::Event, Facet::Day],
        }
    }

    /// Facets that must all be non-empty for this edge to produce options.
    /// These are also the query scope sent to the filter-options service.
    pub fn requires(self) -> &'static [Facet] {
        match self {
            Edge::YearToEvent => &[Facet::Year],
            Edge::EventToDay => &[Facet::Year, Facet::Event],
            Edge::EventDayToTeamMisc => &[Facet::Year, Facet::Event, Facet::Day],
        }
    }

    /// Facets whose options this edge writes
    pub fn targets(self) -> &'static [Facet] {
        match self {
            Edge::YearToEvent => &[Facet::Event],
            Edge::EventToDay => &[Facet::Day],
            Edge::EventDayToTeamMisc => &[Facet::Team, Facet::Misc],
        }
    }

    /// Request slot used when this edge is refreshed remotely
    pub fn slot(self) -> Slot {
        match self {
            Edge::YearToEvent => Slot::EventOptions,
            Edge::EventToDay => Slot::DayOptions,
            Edge::EventDayToTeamMisc => Slot::TeamMiscOptions,
        }
    }

    /// The edge that follows this one in the cascade
    pub fn next(self) -> Option<Edge> {
        match self {
            Edge::YearToEvent => Some(Edge::EventToDay),
            Edge::EventToDay => Some(Edge::EventDayToTeamMisc),
            Edge::EventDayToTeamMisc => None,
        }
    }

    /// Edges affected by a change to any of `changed`, in downstream order
    pub fn triggered_by(changed: &[Facet]) -> Vec<Edge> {
        Edge::ALL
            .into_iter()
            .filter(|edge| edge.triggers().iter().any(|f| changed.contains(f)))
            .collect()
    }
}

/// Active selections plus the options offered for each facet
#[derive(Debug, Clone, Default)]
pub struct FacetFilterStore {
    selections: FacetSelectionSet,
    options: FacetOptionSet,
}

impl FacetFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selections(&self) -> &FacetSelectionSet {
        &self.selections
    }

    pub fn options(&self) -> &FacetOptionSet {
        &self.options
    }

    /// Flip `value` in `facet` and apply the toggle's clearing rules in one update.
    ///
    /// A toggle below an empty facet is ignored, and a facet that becomes
    /// empty takes every selection below it along. Returns every facet whose
    /// selection changed.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> Vec<Facet> {
        if facet.upstream().iter().any(|&up| self.selections.is_empty_at(up)) {
            debug!("Ignoring {} toggle of {:?}: upstream selection is empty", facet, value);
            return Vec::new();
        }

        let mut changed = vec![facet];
        self.selections.toggle(facet, value);

        for &cleared in cleared_by_toggle(facet) {
            if !self.selections.is_empty_at(cleared) {
                self.selections.clear(cleared);
                changed.push(cleared);
            }
        }

        if self.selections.is_empty_at(facet) {
            for below in Facet::ALL.into_iter().filter(|f| f.depth() > facet.depth()) {
                if !self.selections.is_empty_at(below) {
                    self.selections.clear(below);
                    changed.push(below);
                }
            }
        }

        debug_assert!(self.is_consistent());
        changed
    }

    /// Reset every selection. Returns the facets that were non-empty.
    pub fn clear_selections(&mut self) -> Vec<Facet> {
        let changed = Facet::ALL
            .into_iter()
            .filter(|&f| !self.selections.is_empty_at(f))
            .collect();
        self.selections.clear_all();
        changed
    }

    /// Drop every option list except Year's
    pub fn clear_scoped_options(&mut self) {
        for edge in Edge::ALL {
            self.clear_options(edge);
        }
    }

    pub fn clear_all_options(&mut self) {
        self.options.clear_all();
    }

    /// True if every facet the edge depends on has a selection
    pub fn is_ready(&self, edge: Edge) -> bool {
        edge.requires().iter().all(|&f| !self.selections.is_empty_at(f))
    }

    /// Query scope for a remote refresh of `edge`
    pub fn scope(&self, edge: Edge) -> Vec<(Facet, String)> {
        self.selections.pairs(edge.requires())
    }

    pub fn clear_options(&mut self, edge: Edge) {
        for &facet in edge.targets() {
            self.options.clear(facet);
        }
    }

    /// Replace the options of `facet` with normalised `raw` values
    pub fn set_options(&mut self, facet: Facet, raw: Vec<String>) {
        self.options.set(facet, normalize_options(facet, raw));
    }

    /// Replace the options of `facet` as-is
    pub fn set_options_exact(&mut self, facet: Facet, values: Vec<String>) {
        self.options.set(facet, values);
    }

    /// Put back a saved selection set wholesale
    pub fn restore_selections(&mut self, selections: FacetSelectionSet) {
        self.selections = selections;
    }

    /// Check the upstream invariant: a facet may only hold selections if every
    /// facet above it does, and Team/Misc are never both selected.
    pub fn is_consistent(&self) -> bool {
        let s = &self.selections;
        let exclusive = s.is_empty_at(Facet::Team) || s.is_empty_at(Facet::Misc);

        exclusive
            && Facet::ALL
                .into_iter()
                .all(|f| s.is_empty_at(f) || f.upstream().iter().all(|&up| !s.is_empty_at(up)))
    }
}
