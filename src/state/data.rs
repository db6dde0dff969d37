/// Shared data structures for the gallery state
///
/// These types represent the data model that flows between
/// the API layer, the filter/similarity state machine and the UI layer.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Canonical weekday order for Day options.
pub const DAY_ORDER: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// One of the five filterable photo attributes.
///
/// Facets have a fixed order: Year < Event < Day < {Team, Misc}.
/// Team and Misc sit at the same depth and exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Year,
    Event,
    Day,
    Team,
    Misc,
}

impl Facet {
    pub const ALL: [Facet; 5] = [Facet::Year, Facet::Event, Facet::Day, Facet::Team, Facet::Misc];

    /// Name used both in the UI and as the API query parameter / JSON key
    pub fn as_str(self) -> &'static str {
        match self {
            Facet::Year => "Year",
            Facet::Event => "Event",
            Facet::Day => "Day",
            Facet::Team => "Team",
            Facet::Misc => "Misc",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Depth in the hierarchy (Team and Misc share depth 3)
    pub fn depth(self) -> u8 {
        match self {
            Facet::Year => 0,
            Facet::Event => 1,
            Facet::Day => 2,
            Facet::Team | Facet::Misc => 3,
        }
    }

    /// Facets strictly above this one in the hierarchy
    pub fn upstream(self) -> &'static [Facet] {
        match self {
            Facet::Year => &[],
            Facet::Event => &[Facet::Year],
            Facet::Day => &[Facet::Year, Facet::Event],
            Facet::Team | Facet::Misc => &[Facet::Year, Facet::Event, Facet::Day],
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list of string values for each facet.
///
/// Used for both the active selections and the offered options; it is a plain
/// value type, so cloning it yields an independent deep copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetMap {
    values: [Vec<String>; 5],
}

/// The values the user has selected, per facet
pub type FacetSelectionSet = FacetMap;

/// The values currently offered to the user, per facet
pub type FacetOptionSet = FacetMap;

impl FacetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, facet: Facet) -> &[String] {
        &self.values[facet.index()]
    }

    pub fn is_empty_at(&self, facet: Facet) -> bool {
        self.values[facet.index()].is_empty()
    }

    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        self.values[facet.index()].iter().any(|v| v == value)
    }

    /// Replace the list for `facet` (never merges)
    pub fn set(&mut self, facet: Facet, values: Vec<String>) {
        self.values[facet.index()] = values;
    }

    pub fn clear(&mut self, facet: Facet) {
        self.values[facet.index()].clear();
    }

    pub fn clear_all(&mut self) {
        for list in &mut self.values {
            list.clear();
        }
    }

    /// Flip membership of `value`. Returns true if the value is now present.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let list = &mut self.values[facet.index()];
        if let Some(pos) = list.iter().position(|v| v == value) {
            list.remove(pos);
            false
        } else {
            list.push(value.to_string());
            true
        }
    }

    /// Flatten into `(facet, value)` pairs for the given facets, in facet order
    pub fn pairs(&self, facets: &[Facet]) -> Vec<(Facet, String)> {
        facets
            .iter()
            .flat_map(|&facet| self.get(facet).iter().map(move |v| (facet, v.clone())))
            .collect()
    }
}

/// A single photo as returned by the photo-search and similarity services.
///
/// Photos are immutable once fetched. The facet values are only consulted
/// when filtering a similarity result set on the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Photo {
    /// Stable identifier, used as the sort and dedup key
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    #[serde(rename = "hiResUrl")]
    pub hi_res_url: String,
    #[serde(rename = "Year", alias = "year", default, deserialize_with = "opt_string_or_number")]
    pub year: Option<String>,
    #[serde(rename = "Event", alias = "event", default, deserialize_with = "opt_string_or_number")]
    pub event: Option<String>,
    #[serde(rename = "Day", alias = "day", default, deserialize_with = "opt_string_or_number")]
    pub day: Option<String>,
    #[serde(rename = "Team", alias = "team", default, deserialize_with = "opt_string_or_number")]
    pub team: Option<String>,
    #[serde(rename = "Misc", alias = "misc", default, deserialize_with = "opt_string_or_number")]
    pub misc: Option<String>,
}

impl Photo {
    /// The photo's value for a facet, if it has one
    pub fn value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Year => self.year.as_deref(),
            Facet::Event => self.event.as_deref(),
            Facet::Day => self.day.as_deref(),
            Facet::Team => self.team.as_deref(),
            Facet::Misc => self.misc.as_deref(),
        }
    }

    /// True if the photo passes every non-empty facet selection
    pub fn matches(&self, selections: &FacetSelectionSet) -> bool {
        Facet::ALL.iter().all(|&facet| {
            let selected = selections.get(facet);
            selected.is_empty()
                || self
                    .value(facet)
                    .map_or(false, |v| selected.iter().any(|s| s == v))
        })
    }
}

/// Accept `"2023"` or `2023` for identifier-like fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    scalar_to_string(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or number, got {}", value)))
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

/// Strings pass through, numbers are formatted, everything else is absent
pub fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// "unknown" (any case) and blank values are never offered as options
pub fn is_unknown(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown")
}

/// Turn raw option values into the list offered for `facet`.
///
/// Unknown/blank values are dropped and duplicates collapsed. Year keeps the
/// source order, Day follows [`DAY_ORDER`] with unrecognised values appended
/// in source order, and Event/Team/Misc are sorted.
pub fn normalize_options(facet: Facet, raw: Vec<String>) -> Vec<String> {
    let mut values: Vec<String> = Vec::with_capacity(raw.len());
    for value in raw {
        if !is_unknown(&value) && !values.contains(&value) {
            values.push(value);
        }
    }

    match facet {
        Facet::Year => values,
        Facet::Day => order_days(values),
        Facet::Event | Facet::Team | Facet::Misc => {
            values.sort();
            values
        }
    }
}

fn day_rank(value: &str) -> Option<usize> {
    DAY_ORDER.iter().position(|d| d.eq_ignore_ascii_case(value.trim()))
}

fn order_days(values: Vec<String>) -> Vec<String> {
    let (mut known, unknown): (Vec<String>, Vec<String>) =
        values.into_iter().partition(|v| day_rank(v).is_some());
    // stable: equal ranks keep source order
    known.sort_by_key(|v| day_rank(v));
    known.extend(unknown);
    known
}
