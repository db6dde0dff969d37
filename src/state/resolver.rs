/// Photo set resolution
///
/// Pure functions deciding which photos are on screen. Faceted mode turns a
/// complete selection into a photo-search query and orders what comes back;
/// similarity mode filters the in-memory neighbour set and cuts it down with
/// the density slider.

use super::data::{Facet, FacetSelectionSet, Photo};

/// Smallest number of similar photos shown whenever that many survive filtering
pub const DENSITY_FLOOR: usize = 20;

/// Density slider value in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Density(u8);

impl Density {
    pub const MAX: u8 = 100;

    /// Clamp into range
    pub fn new(value: u8) -> Self {
        Density(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Number of photos to show out of `available` post-filter photos:
    /// `0 → min(20, N)`, `100 → N`, otherwise `max(min(20, N), ⌊v/100 · N⌋)`.
    pub fn target_count(self, available: usize) -> usize {
        let floor = DENSITY_FLOOR.min(available);
        match self.0 {
            0 => floor,
            v if v >= Self::MAX => available,
            v => floor.max(available * v as usize / 100),
        }
    }
}

impl Default for Density {
    fn default() -> Self {
        Density(50)
    }
}

/// Where the photos come from
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Server-side photo search over the whole catalog
    Faceted,
    /// A fixed neighbour set, in similarity-rank order
    Similarity(&'a [Photo]),
}

/// Outcome of resolving the display list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The faceted selection is missing a tier; nothing to show, nothing to fetch
    Incomplete,
    /// Ask the photo-search service with these parameters
    Query(Vec<(Facet, String)>),
    /// Show exactly these photos
    Photos(Vec<Photo>),
}

/// Year, Event and Day selected, plus Team or Misc
pub fn is_complete(selections: &FacetSelectionSet) -> bool {
    !selections.is_empty_at(Facet::Year)
        && !selections.is_empty_at(Facet::Event)
        && !selections.is_empty_at(Facet::Day)
        && (!selections.is_empty_at(Facet::Team) || !selections.is_empty_at(Facet::Misc))
}

/// Derive the display list for the current source, selections and slider.
///
/// Idempotent: the same inputs always give the same resolution.
pub fn resolve(source: Source<'_>, selections: &FacetSelectionSet, density: Density) -> Resolution {
    match source {
        Source::Faceted => {
            if is_complete(selections) {
                Resolution::Query(selections.pairs(&Facet::ALL))
            } else {
                Resolution::Incomplete
            }
        }
        Source::Similarity(neighbours) => {
            let filtered: Vec<&Photo> = neighbours.iter().filter(|p| p.matches(selections)).collect();
            let target = density.target_count(filtered.len());
            Resolution::Photos(filtered.into_iter().take(target).cloned().collect())
        }
    }
}

/// Order a photo-search result ascending by id, dropping repeated ids
pub fn order_by_id(mut photos: Vec<Photo>) -> Vec<Photo> {
    photos.sort_by(|a, b| a.id.cmp(&b.id));
    photos.dedup_by(|a, b| a.id == b.id);
    photos
}

/// Keep the first occurrence of each id, preserving rank order
pub fn dedup_ranked(photos: Vec<Photo>) -> Vec<Photo> {
    let mut seen = std::collections::HashSet::new();
    photos.into_iter().filter(|p| seen.insert(p.id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, year: &str, team: Option<&str>) -> Photo {
        Photo {
            id: id.to_string(),
            thumbnail_url: format!("https://img/{id}_t.jpg"),
            hi_res_url: format!("https://img/{id}.jpg"),
            year: Some(year.to_string()),
            event: Some("F1".to_string()),
            day: Some("FRI".to_string()),
            team: team.map(str::to_string),
            misc: None,
        }
    }

    fn neighbours(count: usize) -> Vec<Photo> {
        (0..count).map(|i| photo(&format!("p{i:03}"), "2023", None)).collect()
    }

    #[test]
    fn test_density_mapping() {
        assert_eq!(Density::new(0).target_count(300), 20);
        assert_eq!(Density::new(50).target_count(300), 150);
        assert_eq!(Density::new(100).target_count(300), 300);
        assert_eq!(Density::new(1).target_count(300), 20);
        assert_eq!(Density::new(33).target_count(300), 99);
    }

    #[test]
    fn test_density_small_sets() {
        assert_eq!(Density::new(0).target_count(7), 7);
        assert_eq!(Density::new(50).target_count(30), 20);
        assert_eq!(Density::new(50).target_count(0), 0);
    }

    #[test]
    fn test_density_clamps() {
        assert_eq!(Density::new(250).value(), 100);
        assert_eq!(Density::default().value(), 50);
    }

    #[test]
    fn test_incomplete_faceted_selection() {
        let mut selections = FacetSelectionSet::new();
        selections.toggle(Facet::Year, "2023");
        selections.toggle(Facet::Event, "F1");
        selections.toggle(Facet::Day, "FRI");

        assert_eq!(
            resolve(Source::Faceted, &selections, Density::default()),
            Resolution::Incomplete
        );

        selections.toggle(Facet::Misc, "Podium");
        assert!(matches!(
            resolve(Source::Faceted, &selections, Density::default()),
            Resolution::Query(params) if params.len() == 4
        ));
    }

    #[test]
    fn test_faceted_results_sorted_by_id() {
        let ordered = order_by_id(vec![photo("b", "2023", None), photo("a", "2023", None), photo("b", "2023", None)]);
        let ids: Vec<&str> = ordered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_similarity_uses_post_filter_count() {
        let mut set = neighbours(300);
        set.extend((0..100).map(|i| photo(&format!("old{i}"), "2019", None)));

        let mut selections = FacetSelectionSet::new();
        selections.toggle(Facet::Year, "2023");

        let Resolution::Photos(shown) = resolve(Source::Similarity(&set), &selections, Density::new(50)) else {
            panic!("similarity mode always yields photos");
        };
        assert_eq!(shown.len(), 150);
        assert!(shown.iter().all(|p| p.year.as_deref() == Some("2023")));
    }

    #[test]
    fn test_similarity_keeps_rank_order() {
        let set = vec![photo("z", "2023", None), photo("a", "2023", None), photo("m", "2023", None)];
        let Resolution::Photos(shown) = resolve(Source::Similarity(&set), &FacetSelectionSet::new(), Density::new(100)) else {
            panic!("similarity mode always yields photos");
        };
        let ids: Vec<&str> = shown.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_similarity_filter_requires_every_active_facet() {
        let set = vec![
            photo("a", "2023", Some("Red")),
            photo("b", "2023", Some("Blue")),
            photo("c", "2023", None),
        ];
        let mut selections = FacetSelectionSet::new();
        selections.toggle(Facet::Team, "Red");

        let Resolution::Photos(shown) = resolve(Source::Similarity(&set), &selections, Density::new(100)) else {
            panic!("similarity mode always yields photos");
        };
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, "a");
    }

    #[test]
    fn test_dedup_ranked_keeps_first() {
        let set = vec![photo("x", "2023", None), photo("y", "2023", None), photo("x", "2022", None)];
        let kept = dedup_ranked(set);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].year.as_deref(), Some("2023"));
    }
}
