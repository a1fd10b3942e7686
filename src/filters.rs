// Client-side tour search criteria and their translation into query
// parameters. This state is ephemeral view state; it is never persisted.

use std::collections::BTreeMap;

pub const DEFAULT_PAGE_LIMIT: u64 = 12;

/// Every key a tour search understands. Declaration order is the order the
/// keys are serialized into the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    SearchTerm,
    Location,
    MinPrice,
    MaxPrice,
    StartDate,
    EndDate,
    MinDuration,
    MaxDuration,
    Category,
    Difficulty,
    MinAvailableSeats,
    Page,
    Limit,
}

impl FilterKey {
    pub const ALL: [FilterKey; 13] = [
        FilterKey::SearchTerm,
        FilterKey::Location,
        FilterKey::MinPrice,
        FilterKey::MaxPrice,
        FilterKey::StartDate,
        FilterKey::EndDate,
        FilterKey::MinDuration,
        FilterKey::MaxDuration,
        FilterKey::Category,
        FilterKey::Difficulty,
        FilterKey::MinAvailableSeats,
        FilterKey::Page,
        FilterKey::Limit,
    ];

    /// Wire name of the query parameter.
    pub fn param_name(self) -> &'static str {
        match self {
            FilterKey::SearchTerm => "searchTerm",
            FilterKey::Location => "location",
            FilterKey::MinPrice => "minPrice",
            FilterKey::MaxPrice => "maxPrice",
            FilterKey::StartDate => "startDate",
            FilterKey::EndDate => "endDate",
            FilterKey::MinDuration => "minDuration",
            FilterKey::MaxDuration => "maxDuration",
            FilterKey::Category => "category",
            FilterKey::Difficulty => "difficulty",
            FilterKey::MinAvailableSeats => "minAvailableSeats",
            FilterKey::Page => "page",
            FilterKey::Limit => "limit",
        }
    }

    /// Page and limit are pagination view state, not search criteria. They
    /// never count as active filters and changing other keys resets page.
    pub fn is_view_state(self) -> bool {
        matches!(self, FilterKey::Page | FilterKey::Limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(u64),
    Float(f64),
}

impl FilterValue {
    /// UI selects report "all" and text inputs report "" for the unselected
    /// state; both mean "remove this filter". A genuine search term of the
    /// literal string "all" is discarded as well, matching the shipped
    /// behavior of the web client.
    fn is_unset_marker(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.is_empty() || s == "all")
    }

    fn to_param(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Float(n) => n.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(value as u64)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

/// The flat filter state behind a tour search view.
///
/// Always carries `page` and `limit`; every other key is present only while
/// actively filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct TourFilters {
    values: BTreeMap<FilterKey, FilterValue>,
    default_limit: u64,
}

impl Default for TourFilters {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl TourFilters {
    pub fn new(default_limit: u64) -> Self {
        let mut values = BTreeMap::new();
        values.insert(FilterKey::Page, FilterValue::Int(1));
        values.insert(FilterKey::Limit, FilterValue::Int(default_limit));
        Self {
            values,
            default_limit,
        }
    }

    /// Sets one filter. Unset markers ("all" / "") remove the key instead.
    /// Any update to a key other than `Page` resets the page to 1 in the
    /// same step, so "change page" and "change a filter" are mutually
    /// exclusive single updates. Unset markers aimed at `Page` or `Limit`
    /// are ignored; pagination always has a value.
    pub fn update(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        let value = value.into();
        if value.is_unset_marker() {
            if !key.is_view_state() {
                self.values.remove(&key);
            }
        } else {
            self.values.insert(key, value);
        }
        if key != FilterKey::Page {
            self.values.insert(FilterKey::Page, FilterValue::Int(1));
        }
    }

    /// Back to a pristine `{page: 1, limit: default}` state.
    pub fn clear(&mut self) {
        self.values.clear();
        self.values.insert(FilterKey::Page, FilterValue::Int(1));
        self.values
            .insert(FilterKey::Limit, FilterValue::Int(self.default_limit));
    }

    /// Removes exactly one key; everything else, including the current
    /// page, stays as it was.
    pub fn clear_filter(&mut self, key: FilterKey) {
        self.values.remove(&key);
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.values.get(&key)
    }

    pub fn page(&self) -> u64 {
        match self.values.get(&FilterKey::Page) {
            Some(FilterValue::Int(n)) => *n,
            _ => 1,
        }
    }

    pub fn limit(&self) -> u64 {
        match self.values.get(&FilterKey::Limit) {
            Some(FilterValue::Int(n)) => *n,
            _ => self.default_limit,
        }
    }

    /// Recomputed from the current state on every call so derived views can
    /// never drift from the filters themselves.
    pub fn active_filter_count(&self) -> usize {
        self.values
            .keys()
            .filter(|key| !key.is_view_state())
            .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Defined keys only, in declaration order; unset keys are omitted
    /// entirely rather than sent as empty strings.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        self.values
            .iter()
            .map(|(key, value)| (key.param_name(), value.to_param()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use test_case::test_case;

    #[test]
    fn starts_with_page_and_limit_only() {
        let filters = TourFilters::default();
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(filters.active_filter_count(), 0);
        assert!(!filters.has_active_filters());
    }

    #[test]
    fn non_page_update_resets_page() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Page, 5u64);
        assert_eq!(filters.page(), 5);

        filters.update(FilterKey::Category, "historical");
        assert_eq!(filters.page(), 1);
        assert_eq!(
            filters.get(FilterKey::Category),
            Some(&FilterValue::Text("historical".to_string()))
        );
    }

    #[test]
    fn page_update_does_not_reset_itself() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Page, 3u64);
        assert_eq!(filters.page(), 3);
    }

    #[test]
    fn limit_update_also_resets_page() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Page, 4u64);
        filters.update(FilterKey::Limit, 24u64);
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.limit(), 24);
    }

    #[test_case("all" ; "select-all marker")]
    #[test_case("" ; "empty string marker")]
    fn unset_markers_remove_the_key(marker: &str) {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Location, "Samarkand");
        filters.update(FilterKey::Location, marker);
        assert_eq!(filters.get(FilterKey::Location), None);
        assert_eq!(filters.active_filter_count(), 0);
    }

    #[test]
    fn unset_marker_still_resets_page() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Page, 9u64);
        filters.update(FilterKey::Category, "all");
        assert_eq!(filters.page(), 1);
    }

    #[test]
    fn unset_marker_on_view_state_is_ignored() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Limit, "all");
        assert_eq!(filters.limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn clear_yields_exactly_page_and_limit() {
        let mut filters = TourFilters::new(20);
        filters.update(FilterKey::SearchTerm, "registan");
        filters.update(FilterKey::MinPrice, 100.0);
        filters.update(FilterKey::Page, 7u64);

        filters.clear();

        assert_eq!(filters, TourFilters::new(20));
        assert_eq!(
            filters.to_query_params(),
            vec![("page", "1".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn clear_filter_removes_exactly_one_key() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Category, "cultural");
        filters.update(FilterKey::Location, "Bukhara");
        filters.update(FilterKey::Page, 3u64);

        filters.clear_filter(FilterKey::Category);

        assert_eq!(filters.get(FilterKey::Category), None);
        assert_eq!(
            filters.get(FilterKey::Location),
            Some(&FilterValue::Text("Bukhara".to_string()))
        );
        // clear_filter leaves the page untouched.
        assert_eq!(filters.page(), 3);
    }

    #[test]
    fn intervening_page_change_is_overridden_by_later_filter_update() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::Category, "historical");
        filters.update(FilterKey::Page, 3u64);
        filters.update(FilterKey::Location, "Samarkand");

        assert_eq!(
            filters.get(FilterKey::Category),
            Some(&FilterValue::Text("historical".to_string()))
        );
        assert_eq!(
            filters.get(FilterKey::Location),
            Some(&FilterValue::Text("Samarkand".to_string()))
        );
        assert_eq!(filters.page(), 1);
    }

    #[test]
    fn query_params_follow_declaration_order_and_omit_unset_keys() {
        let mut filters = TourFilters::default();
        filters.update(FilterKey::MaxPrice, 500.0);
        filters.update(FilterKey::MinPrice, 100.0);
        filters.update(FilterKey::Page, 2u64);

        assert_eq!(
            filters.to_query_params(),
            vec![
                ("minPrice", "100".to_string()),
                ("maxPrice", "500".to_string()),
                ("page", "2".to_string()),
                ("limit", "12".to_string()),
            ]
        );
    }

    #[test]
    fn active_filter_count_matches_non_view_state_keys_for_random_states() {
        let mut rng = rand::thread_rng();
        let criteria: Vec<FilterKey> = FilterKey::ALL
            .iter()
            .copied()
            .filter(|k| !k.is_view_state())
            .collect();

        for _ in 0..100 {
            let mut filters = TourFilters::default();
            let mut expected = std::collections::BTreeSet::new();
            for _ in 0..rng.gen_range(0..20) {
                let key = criteria[rng.gen_range(0..criteria.len())];
                if rng.gen_bool(0.3) {
                    filters.update(key, "all");
                    expected.remove(&key);
                } else {
                    filters.update(key, rng.gen_range(1u64..1000));
                    expected.insert(key);
                }
            }
            assert_eq!(filters.active_filter_count(), expected.len());
            assert_eq!(filters.has_active_filters(), !expected.is_empty());
        }
    }
}
