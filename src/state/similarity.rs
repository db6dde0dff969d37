/// Similarity mode controller
///
/// Tracks the "more like this" lifecycle: which photo is the anchor, the
/// neighbour set the similarity service returned, the density slider, and the
/// facet snapshot taken when the user first left faceted browsing.

use super::data::{normalize_options, Facet, FacetOptionSet, FacetSelectionSet, Photo};
use super::filters::Edge;
use super::resolver::{dedup_ranked, Density};

/// Lifecycle of similarity exploration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityState {
    /// Faceted browsing
    #[default]
    Idle,
    /// Waiting for the similarity service
    Loading,
    /// Neighbour set present
    Active,
    /// The service returned nothing, or failed
    Empty,
}

/// Which browsing mode is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Faceted,
    Similarity { loading: bool },
}

/// Structural copy of the facet state at the moment similarity mode was entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFacetSnapshot {
    pub selections: FacetSelectionSet,
    pub options: FacetOptionSet,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityModeController {
    state: SimilarityState,
    anchor: Option<Photo>,
    neighbours: Vec<Photo>,
    snapshot: Option<SavedFacetSnapshot>,
    density: Density,
}

impl SimilarityModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SimilarityState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            SimilarityState::Idle => Mode::Faceted,
            SimilarityState::Loading => Mode::Similarity { loading: true },
            SimilarityState::Active | SimilarityState::Empty => Mode::Similarity { loading: false },
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != SimilarityState::Idle
    }

    pub fn anchor(&self) -> Option<&Photo> {
        self.anchor.as_ref()
    }

    pub fn neighbours(&self) -> &[Photo] {
        &self.neighbours
    }

    pub fn snapshot(&self) -> Option<&SavedFacetSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn set_density(&mut self, density: Density) {
        self.density = density;
    }

    /// Start (or restart) exploring around `anchor`.
    ///
    /// The facet snapshot is only taken when coming from faceted browsing; a
    /// second "more like this" keeps the original one.
    pub fn enter(&mut self, anchor: Photo, selections: &FacetSelectionSet, options: &FacetOptionSet) {
        if self.state == SimilarityState::Idle {
            self.snapshot = Some(SavedFacetSnapshot {
                selections: selections.clone(),
                options: options.clone(),
            });
        }

        self.anchor = Some(anchor);
        self.neighbours.clear();
        self.density = Density::default();
        self.state = SimilarityState::Loading;
    }

    /// Store the neighbour set. Returns true if anything came back.
    pub fn receive(&mut self, photos: Vec<Photo>) -> bool {
        self.neighbours = dedup_ranked(photos);
        self.state = if self.neighbours.is_empty() {
            SimilarityState::Empty
        } else {
            SimilarityState::Active
        };
        self.state == SimilarityState::Active
    }

    /// The similarity fetch failed
    pub fn fail(&mut self) {
        self.neighbours.clear();
        self.state = SimilarityState::Empty;
    }

    /// Leave similarity mode, handing back the snapshot to restore from
    pub fn exit(&mut self) -> Option<SavedFacetSnapshot> {
        self.state = SimilarityState::Idle;
        self.anchor = None;
        self.neighbours = Vec::new();
        self.snapshot.take()
    }

    /// Forget everything, including the snapshot and the slider position
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Distinct Year values in the neighbour set, sorted
    pub fn year_options(&self) -> Vec<String> {
        let mut years = normalize_options(Facet::Year, self.values_of(Facet::Year, &FacetSelectionSet::new(), &[]));
        years.sort();
        years
    }

    /// Options for the targets of `edge`, scanned from neighbours matching the
    /// edge's upstream selections. Empty until those selections are present.
    pub fn scoped_options(&self, edge: Edge, selections: &FacetSelectionSet) -> Vec<(Facet, Vec<String>)> {
        let ready = edge.requires().iter().all(|&f| !selections.is_empty_at(f));

        edge.targets()
            .iter()
            .map(|&facet| {
                let values = if ready {
                    normalize_options(facet, self.values_of(facet, selections, edge.requires()))
                } else {
                    Vec::new()
                };
                (facet, values)
            })
            .collect()
    }

    /// Values of `facet` across neighbours whose `scope` facets match `selections`
    fn values_of(&self, facet: Facet, selections: &FacetSelectionSet, scope: &[Facet]) -> Vec<String> {
        self.neighbours
            .iter()
            .filter(|photo| {
                scope.iter().all(|&f| {
                    photo
                        .value(f)
                        .map_or(false, |v| selections.get(f).iter().any(|s| s == v))
                })
            })
            .filter_map(|photo| photo.value(facet).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, year: &str, event: &str, day: &str, team: Option<&str>, misc: Option<&str>) -> Photo {
        Photo {
            id: id.to_string(),
            thumbnail_url: format!("{id}_t"),
            hi_res_url: format!("{id}_h"),
            year: Some(year.to_string()),
            event: Some(event.to_string()),
            day: Some(day.to_string()),
            team: team.map(str::to_string),
            misc: misc.map(str::to_string),
        }
    }

    fn neighbour_set() -> Vec<Photo> {
        vec![
            photo("1", "2023", "F1", "SAT", Some("Red"), None),
            photo("2", "2022", "GT", "FRI", Some("Blue"), None),
            photo("3", "2023", "F1", "FRI", None, Some("Podium")),
            photo("4", "2023", "Rally", "SUN", Some("unknown"), None),
            photo("5", "2021", "F1", "MON", None, Some("Crowd")),
        ]
    }

    fn selections(picks: &[(Facet, &str)]) -> FacetSelectionSet {
        let mut set = FacetSelectionSet::new();
        for &(facet, value) in picks {
            set.toggle(facet, value);
        }
        set
    }

    #[test]
    fn test_snapshot_taken_only_from_idle() {
        let mut controller = SimilarityModeController::new();
        let first = selections(&[(Facet::Year, "2022")]);
        let anchor = photo("a", "2022", "F1", "FRI", None, None);

        controller.enter(anchor.clone(), &first, &FacetOptionSet::new());
        controller.receive(neighbour_set());
        controller.enter(anchor, &selections(&[(Facet::Year, "2023")]), &FacetOptionSet::new());

        assert_eq!(controller.snapshot().map(|s| &s.selections), Some(&first));
        assert_eq!(controller.state(), SimilarityState::Loading);
    }

    #[test]
    fn test_enter_resets_density() {
        let mut controller = SimilarityModeController::new();
        controller.set_density(Density::new(90));
        controller.enter(photo("a", "2022", "F1", "FRI", None, None), &FacetSelectionSet::new(), &FacetOptionSet::new());
        assert_eq!(controller.density(), Density::default());
    }

    #[test]
    fn test_empty_result_and_failure() {
        let mut controller = SimilarityModeController::new();
        controller.enter(photo("a", "2022", "F1", "FRI", None, None), &FacetSelectionSet::new(), &FacetOptionSet::new());
        assert!(!controller.receive(Vec::new()));
        assert_eq!(controller.state(), SimilarityState::Empty);
        assert_eq!(controller.mode(), Mode::Similarity { loading: false });

        controller.fail();
        assert_eq!(controller.state(), SimilarityState::Empty);
    }

    #[test]
    fn test_exit_hands_back_snapshot_once() {
        let mut controller = SimilarityModeController::new();
        controller.enter(photo("a", "2022", "F1", "FRI", None, None), &FacetSelectionSet::new(), &FacetOptionSet::new());

        assert!(controller.exit().is_some());
        assert_eq!(controller.mode(), Mode::Faceted);
        assert!(controller.anchor().is_none());
        assert!(controller.exit().is_none());
    }

    #[test]
    fn test_year_options_sorted_distinct() {
        let mut controller = SimilarityModeController::new();
        controller.receive(neighbour_set());
        assert_eq!(controller.year_options(), vec!["2021", "2022", "2023"]);
    }

    #[test]
    fn test_scoped_options_follow_upstream_selection() {
        let mut controller = SimilarityModeController::new();
        controller.receive(neighbour_set());

        let none = controller.scoped_options(Edge::YearToEvent, &FacetSelectionSet::new());
        assert_eq!(none, vec![(Facet::Event, Vec::<String>::new())]);

        let year = selections(&[(Facet::Year, "2023")]);
        assert_eq!(
            controller.scoped_options(Edge::YearToEvent, &year),
            vec![(Facet::Event, vec!["F1".to_string(), "Rally".to_string()])]
        );

        let day_scope = selections(&[(Facet::Year, "2023"), (Facet::Event, "F1")]);
        assert_eq!(
            controller.scoped_options(Edge::EventToDay, &day_scope),
            vec![(Facet::Day, vec!["FRI".to_string(), "SAT".to_string()])]
        );

        let leaf_scope = selections(&[
            (Facet::Year, "2023"),
            (Facet::Event, "F1"),
            (Facet::Event, "Rally"),
            (Facet::Day, "SAT"),
            (Facet::Day, "SUN"),
        ]);
        assert_eq!(
            controller.scoped_options(Edge::EventDayToTeamMisc, &leaf_scope),
            vec![(Facet::Team, vec!["Red".to_string()]), (Facet::Misc, Vec::new())]
        );
    }
}
