use outpost_domain::{EntityRecord, StatusKey};

pub const ALL_SENTINEL: &str = "all";

/// A select box value: either the `"all"` sentinel or one concrete option.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Choice<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }

    /// Maps the raw select value, treating blank and `"all"` as no constraint.
    pub fn parse_with<E>(raw: &str, parse: impl FnOnce(&str) -> Result<T, E>) -> Result<Self, E> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL_SENTINEL) {
            return Ok(Self::All);
        }
        parse(raw).map(Self::Only)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<S> {
    pub search: String,
    pub category: Choice<String>,
    pub status: Choice<S>,
}

impl<S> Default for FilterState<S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: Choice::All,
            status: Choice::All,
        }
    }
}

impl<S: StatusKey> FilterState<S> {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: Choice<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_status(mut self, status: Choice<S>) -> Self {
        self.status = status;
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search.trim().is_empty() && self.category.is_all() && self.status.is_all()
    }
}

pub fn matches<R: EntityRecord>(record: &R, state: &FilterState<R::Status>) -> bool {
    let needle = state.search.trim().to_lowercase();
    matches_with_needle(record, state, &needle)
}

fn matches_with_needle<R: EntityRecord>(
    record: &R,
    state: &FilterState<R::Status>,
    needle: &str,
) -> bool {
    if !needle.is_empty()
        && !record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    {
        return false;
    }

    if let Some(category) = state.category.as_only() {
        if record.category() != Some(category.as_str()) {
            return false;
        }
    }

    if let Some(status) = state.status.as_only() {
        if record.status() != *status {
            return false;
        }
    }

    true
}

/// Returns the records satisfying every active constraint, in input order.
pub fn filter<R: EntityRecord>(records: &[R], state: &FilterState<R::Status>) -> Vec<R> {
    let needle = state.search.trim().to_lowercase();
    records
        .iter()
        .filter(|record| matches_with_needle(*record, state, &needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use outpost_domain::{Endpoint, EndpointStatus, RecordId};
    use proptest::prelude::*;

    use super::*;

    fn endpoint(id: &str, hostname: &str, platform: &str, status: EndpointStatus) -> Endpoint {
        Endpoint {
            id: RecordId::from(id),
            hostname: hostname.to_owned(),
            ip_address: format!("10.0.0.{}", id.len()),
            platform: platform.to_owned(),
            os_version: None,
            status,
            risk_score: 10,
            open_alerts: 0,
            last_seen: None,
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = vec![
            endpoint("ep-1", "WEB-01", "linux", EndpointStatus::Online),
            endpoint("ep-2", "DB-01", "linux", EndpointStatus::Online),
        ];
        let state = FilterState::default().with_search("web");

        let filtered = filter(&records, &state);

        assert_eq!(filtered, vec![records[0].clone()]);
    }

    #[test]
    fn search_also_matches_secondary_field() {
        let mut record = endpoint("ep-1", "WEB-01", "linux", EndpointStatus::Online);
        record.ip_address = "192.168.40.7".to_owned();
        assert!(matches(&record, &FilterState::default().with_search("168.40")));
    }

    #[test]
    fn empty_and_blank_search_match_everything() {
        let records = vec![
            endpoint("ep-1", "WEB-01", "linux", EndpointStatus::Online),
            endpoint("ep-2", "DB-01", "windows", EndpointStatus::Offline),
        ];
        assert_eq!(filter(&records, &FilterState::default()), records);
        assert_eq!(
            filter(&records, &FilterState::default().with_search("   ")),
            records
        );
    }

    #[test]
    fn constraints_combine_with_and_and_preserve_order() {
        let records = vec![
            endpoint("ep-1", "WEB-01", "linux", EndpointStatus::Online),
            endpoint("ep-2", "WEB-02", "windows", EndpointStatus::Online),
            endpoint("ep-3", "WEB-03", "linux", EndpointStatus::Isolated),
            endpoint("ep-4", "WEB-04", "linux", EndpointStatus::Online),
        ];
        let state = FilterState::default()
            .with_search("web")
            .with_category(Choice::Only("linux".to_owned()))
            .with_status(Choice::Only(EndpointStatus::Online));

        let ids = filter(&records, &state)
            .into_iter()
            .map(|record| record.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![RecordId::from("ep-1"), RecordId::from("ep-4")]);
    }

    #[test]
    fn category_match_is_exact() {
        let record = endpoint("ep-1", "WEB-01", "linux", EndpointStatus::Online);
        assert!(!matches(
            &record,
            &FilterState::default().with_category(Choice::Only("Linux".to_owned()))
        ));
        assert!(!matches(
            &record,
            &FilterState::default().with_category(Choice::Only("lin".to_owned()))
        ));
    }

    #[test]
    fn choice_parse_treats_all_sentinel_and_blank_as_unconstrained() {
        let parse = |raw: &str| {
            Choice::parse_with(raw, |value| {
                EndpointStatus::parse(value).ok_or_else(|| value.to_owned())
            })
        };
        assert_eq!(parse("all"), Ok(Choice::All));
        assert_eq!(parse("ALL"), Ok(Choice::All));
        assert_eq!(parse(""), Ok(Choice::All));
        assert_eq!(parse("isolated"), Ok(Choice::Only(EndpointStatus::Isolated)));
        assert_eq!(parse("bogus"), Err("bogus".to_owned()));
    }

    fn arb_status() -> impl Strategy<Value = EndpointStatus> {
        prop::sample::select(EndpointStatus::ALL.to_vec())
    }

    fn arb_platform() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["linux", "windows", "macos"]).prop_map(str::to_owned)
    }

    fn arb_records() -> impl Strategy<Value = Vec<Endpoint>> {
        prop::collection::vec(("[A-Za-z]{1,6}-[0-9]{2}", arb_platform(), arb_status()), 0..24)
            .prop_map(|rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(index, (hostname, platform, status))| {
                        endpoint(&format!("ep-{index}"), &hostname, &platform, status)
                    })
                    .collect()
            })
    }

    fn arb_state() -> impl Strategy<Value = FilterState<EndpointStatus>> {
        (
            "[a-zA-Z0-9-]{0,3}",
            prop::option::of(arb_platform()),
            prop::option::of(arb_status()),
        )
            .prop_map(|(search, category, status)| FilterState {
                search,
                category: category.map_or(Choice::All, Choice::Only),
                status: status.map_or(Choice::All, Choice::Only),
            })
    }

    proptest! {
        #[test]
        fn filtered_view_is_subset_of_input(records in arb_records(), state in arb_state()) {
            let input_ids = records.iter().map(|record| record.id.clone()).collect::<HashSet<_>>();
            for record in filter(&records, &state) {
                prop_assert!(input_ids.contains(&record.id));
            }
        }

        #[test]
        fn filtering_twice_equals_filtering_once(records in arb_records(), state in arb_state()) {
            let once = filter(&records, &state);
            let twice = filter(&once, &state);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn unconstrained_state_is_identity(records in arb_records()) {
            prop_assert_eq!(filter(&records, &FilterState::default()), records);
        }
    }
}
