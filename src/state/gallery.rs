/// Gallery session
///
/// The single owner of the browsing state. Every user operation mutates the
/// filter store / similarity controller synchronously, re-derives the display
/// list, and returns the fetches that must be issued. Responses come back
/// through [`Gallery::apply`] together with the ticket they were issued under;
/// responses for superseded tickets are dropped.

use tracing::{debug, info, warn};

use super::data::{Facet, FacetOptionSet, FacetSelectionSet, Photo};
use super::filters::{Edge, FacetFilterStore};
use super::resolver::{is_complete, order_by_id, resolve, Density, Resolution, Source};
use super::similarity::{Mode, SavedFacetSnapshot, SimilarityModeController, SimilarityState};
use crate::api::request::{Fetch, FetchOutcome, FilterOptions, Payload, Query, Slot, Ticket, TicketBook};
use crate::error::FetchError;

/// At most this many similar photos are shown when a neighbour set first arrives
pub const INITIAL_SIMILAR_WINDOW: usize = 200;

#[derive(Debug)]
pub struct Gallery {
    filters: FacetFilterStore,
    similarity: SimilarityModeController,
    display: Vec<Photo>,
    tickets: TicketBook,
    /// Edge whose response continues the post-similarity restore cascade
    restoring: Option<Edge>,
    similar_limit: usize,
}

impl Gallery {
    pub fn new(similar_limit: usize) -> Self {
        Self {
            filters: FacetFilterStore::new(),
            similarity: SimilarityModeController::new(),
            display: Vec::new(),
            tickets: TicketBook::default(),
            restoring: None,
            similar_limit,
        }
    }

    /// Load the top-level Year options
    pub fn start(&mut self) -> Vec<Fetch> {
        vec![self.request_years()]
    }

    pub fn selections(&self) -> &FacetSelectionSet {
        self.filters.selections()
    }

    pub fn options(&self) -> &FacetOptionSet {
        self.filters.options()
    }

    /// The photos currently on screen
    pub fn display(&self) -> &[Photo] {
        &self.display
    }

    pub fn mode(&self) -> Mode {
        self.similarity.mode()
    }

    pub fn similarity_state(&self) -> SimilarityState {
        self.similarity.state()
    }

    pub fn anchor(&self) -> Option<&Photo> {
        self.similarity.anchor()
    }

    pub fn density(&self) -> Density {
        self.similarity.density()
    }

    pub fn snapshot(&self) -> Option<&SavedFacetSnapshot> {
        self.similarity.snapshot()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.is_some()
    }

    /// Message to show instead of (or above) the grid, if any
    pub fn status(&self) -> Option<&'static str> {
        match self.similarity.state() {
            SimilarityState::Idle if !is_complete(self.filters.selections()) => {
                Some("Please select Year ▶ Event ▶ Day ▶ (Team or Misc) to see photos.")
            }
            SimilarityState::Loading => Some("Finding similar photos…"),
            SimilarityState::Empty => Some("No similar photos found."),
            SimilarityState::Active if self.display.is_empty() => Some("No similar photos match these filters."),
            _ => None,
        }
    }

    /// Toggle a facet value and re-derive everything downstream of it
    pub fn toggle(&mut self, facet: Facet, value: &str) -> Vec<Fetch> {
        let changed = self.filters.toggle(facet, value);
        if changed.is_empty() {
            return Vec::new();
        }

        if self.restoring.take().is_some() {
            debug!("Restore cascade superseded by a {} toggle", facet);
        }
        debug!("🔘 Toggled {} {:?}, changed: {:?}", facet, value, changed);

        if self.similarity.is_active() {
            self.refresh_scoped(&changed);
            self.redisplay_similar();
            Vec::new()
        } else {
            let mut fetches = self.refresh_remote(&changed);
            fetches.extend(self.request_photos());
            fetches
        }
    }

    /// "Clear All Filters": back to a fresh faceted session
    pub fn clear(&mut self) -> Vec<Fetch> {
        let was_similar = self.similarity.is_active();

        self.similarity.reset();
        self.restoring = None;
        self.filters.clear_selections();
        self.filters.clear_scoped_options();
        self.display.clear();
        for slot in Slot::ALL {
            if slot != Slot::YearOptions {
                self.tickets.invalidate(slot);
            }
        }

        info!("🧹 Cleared all filters");

        if was_similar {
            // Year options were scoped to the neighbour set
            self.filters.clear_all_options();
        }
        self.reload_years_if_missing().into_iter().collect()
    }

    /// Move the density slider. Only changes the display in similarity mode.
    pub fn set_density(&mut self, value: u8) {
        self.similarity.set_density(Density::new(value));
        if self.similarity.is_active() {
            self.redisplay_similar();
        }
    }

    /// "More like this": explore the neighbours of `photo`
    pub fn request_similar_to(&mut self, photo: Photo) -> Vec<Fetch> {
        self.similarity.enter(photo.clone(), self.filters.selections(), self.filters.options());

        self.restoring = None;
        self.filters.clear_selections();
        self.filters.clear_all_options();
        self.display.clear();
        for slot in Slot::ALL {
            self.tickets.invalidate(slot);
        }

        info!("🔍 Finding photos similar to {}", photo.id);

        let query = Query::Similar {
            id: photo.id,
            limit: self.similar_limit,
        };
        vec![self.issue(Slot::Similar, query)]
    }

    /// Leave similarity mode and rebuild the faceted state from the snapshot
    pub fn clear_similarity(&mut self) -> Vec<Fetch> {
        if !self.similarity.is_active() {
            return Vec::new();
        }

        let snapshot = self.similarity.exit();
        self.tickets.invalidate(Slot::Similar);
        self.display.clear();
        self.filters.clear_all_options();

        match snapshot {
            Some(snapshot) => {
                info!("↩️  Restoring filters from before similarity mode");
                self.filters.restore_selections(snapshot.selections);
                self.filters
                    .set_options_exact(Facet::Year, snapshot.options.get(Facet::Year).to_vec());
                let mut fetches = self.advance_restore(None);
                // the snapshot was taken before the Year options arrived
                fetches.extend(self.reload_years_if_missing());
                fetches
            }
            None => {
                self.filters.clear_selections();
                vec![self.request_years()]
            }
        }
    }

    /// Feed back the outcome of a fetch this session issued
    pub fn apply(&mut self, ticket: Ticket, outcome: FetchOutcome) -> Vec<Fetch> {
        if !self.tickets.is_current(ticket) {
            debug!("Discarding stale {:?} response #{}", ticket.slot, ticket.seq);
            return Vec::new();
        }

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) if e.is_malformed() => {
                warn!("⚠️  {}; treating as empty", e);
                Payload::empty_for(ticket.slot)
            }
            Err(e) => {
                self.fail(ticket.slot, &e);
                return Vec::new();
            }
        };

        match (ticket.slot, payload) {
            (Slot::Photos, Payload::Photos(photos)) => {
                self.display = order_by_id(photos);
                info!("🖼️  {} photos match the current filters", self.display.len());
                Vec::new()
            }
            (Slot::Similar, Payload::Photos(photos)) => {
                self.receive_similar(photos);
                Vec::new()
            }
            (Slot::Photos | Slot::Similar, Payload::Options(_)) | (_, Payload::Photos(_)) => {
                warn!("⚠️  Unexpected payload kind for {:?}, ignoring", ticket.slot);
                Vec::new()
            }
            (slot, Payload::Options(options)) => self.receive_options(slot, &options),
        }
    }

    fn issue(&mut self, slot: Slot, query: Query) -> Fetch {
        let ticket = self.tickets.issue(slot);
        Fetch { ticket, query }
    }

    fn request_years(&mut self) -> Fetch {
        self.issue(Slot::YearOptions, Query::FilterOptions(Vec::new()))
    }

    /// Retry the top-level Year options if none are loaded
    fn reload_years_if_missing(&mut self) -> Option<Fetch> {
        if self.filters.options().is_empty_at(Facet::Year) {
            Some(self.request_years())
        } else {
            None
        }
    }

    fn request_edge(&mut self, edge: Edge) -> Fetch {
        let scope = self.filters.scope(edge);
        self.issue(edge.slot(), Query::FilterOptions(scope))
    }

    /// Faceted mode: refetch options for triggered edges; force-empty every
    /// edge whose upstream selection is missing.
    fn refresh_remote(&mut self, changed: &[Facet]) -> Vec<Fetch> {
        let triggered = Edge::triggered_by(changed);
        let mut fetches = Vec::new();

        for edge in Edge::ALL {
            if !self.filters.is_ready(edge) {
                self.filters.clear_options(edge);
                self.tickets.invalidate(edge.slot());
            } else if triggered.contains(&edge) {
                fetches.push(self.request_edge(edge));
            }
        }

        fetches
    }

    /// Similarity mode: the same graph, evaluated against the neighbour set
    fn refresh_scoped(&mut self, changed: &[Facet]) {
        let triggered = Edge::triggered_by(changed);

        for edge in Edge::ALL {
            if triggered.contains(&edge) || !self.filters.is_ready(edge) {
                for (facet, values) in self.similarity.scoped_options(edge, self.filters.selections()) {
                    self.filters.set_options_exact(facet, values);
                }
            }
        }
    }

    /// Issue the photo query for a complete selection, or empty the display
    fn request_photos(&mut self) -> Option<Fetch> {
        match resolve(Source::Faceted, self.filters.selections(), self.similarity.density()) {
            Resolution::Query(params) => Some(self.issue(Slot::Photos, Query::Photos(params))),
            Resolution::Incomplete | Resolution::Photos(_) => {
                self.display.clear();
                self.tickets.invalidate(Slot::Photos);
                None
            }
        }
    }

    fn redisplay_similar(&mut self) {
        let resolution = resolve(
            Source::Similarity(self.similarity.neighbours()),
            self.filters.selections(),
            self.similarity.density(),
        );
        if let Resolution::Photos(photos) = resolution {
            self.display = photos;
        }
    }

    fn receive_similar(&mut self, photos: Vec<Photo>) {
        let anchor = self.similarity.anchor().map(|p| p.id.clone()).unwrap_or_default();

        if self.similarity.receive(photos) {
            self.filters.clear_all_options();
            self.filters
                .set_options_exact(Facet::Year, self.similarity.year_options());
            self.refresh_scoped(&Facet::ALL);
            self.redisplay_similar();
            self.display.truncate(INITIAL_SIMILAR_WINDOW);
            info!(
                "✨ {} similar photos for {}, showing {}",
                self.similarity.neighbours().len(),
                anchor,
                self.display.len()
            );
        } else {
            self.display.clear();
            info!("No similar photos for {}", anchor);
        }
    }

    fn receive_options(&mut self, slot: Slot, options: &FilterOptions) -> Vec<Fetch> {
        for &facet in slot.option_targets() {
            let raw = options.get(facet).map(<[String]>::to_vec).unwrap_or_default();
            self.filters.set_options(facet, raw);
        }

        match self.restoring {
            Some(edge) if edge.slot() == slot => self.advance_restore(Some(edge)),
            _ => Vec::new(),
        }
    }

    /// Run the next stage of the restore cascade after `done` has settled
    /// (`None` to start it). Each stage is scoped by the live result of the
    /// previous one; once the cascade ends the photo query goes out.
    fn advance_restore(&mut self, done: Option<Edge>) -> Vec<Fetch> {
        let next = match done {
            None => Some(Edge::YearToEvent),
            Some(edge) => edge.next(),
        };

        match next {
            Some(edge) if self.filters.is_ready(edge) => {
                self.restoring = Some(edge);
                vec![self.request_edge(edge)]
            }
            _ => {
                self.restoring = None;
                self.request_photos().into_iter().collect()
            }
        }
    }

    /// Transport failures leave prior state alone; a failed similarity fetch
    /// lands in the Empty state.
    fn fail(&mut self, slot: Slot, error: &FetchError) {
        warn!("⚠️  {:?} request failed: {}", slot, error);

        if slot == Slot::Similar {
            self.similarity.fail();
            self.display.clear();
        }

        if self.restoring.map(Edge::slot) == Some(slot) {
            self.restoring = None;
        }
    }
}
