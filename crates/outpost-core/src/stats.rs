use std::collections::BTreeMap;

use outpost_domain::{EntityRecord, MetricKey, StatusKey};

/// Which collection a summary card is computed from. Every call site names
/// one; there is no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    /// The currently filtered view.
    Filtered,
    /// The whole loaded collection, regardless of filters.
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub sum: f64,
    pub count: usize,
    pub average: f64,
}

impl Aggregate {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
            (sum + value, count + 1)
        });
        let average = if count == 0 { 0.0 } else { sum / count as f64 };
        Self {
            sum,
            count,
            average,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedStats<S: StatusKey, M: MetricKey> {
    pub total: usize,
    pub by_status: BTreeMap<S, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub metrics: BTreeMap<M, Aggregate>,
}

impl<S: StatusKey, M: MetricKey> DerivedStats<S, M> {
    pub fn count(&self, status: S) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    pub fn aggregate(&self, metric: M) -> Aggregate {
        self.metrics.get(&metric).copied().unwrap_or_default()
    }

    pub fn terminal_count(&self) -> usize {
        self.by_status
            .iter()
            .filter(|(status, _)| status.is_terminal())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Reduces `records` to summary counters. Every status of the domain gets a
/// bucket, so the buckets always sum to `total`.
pub fn compute_stats<R: EntityRecord>(
    records: &[R],
    metrics: &[R::Metric],
) -> DerivedStats<R::Status, R::Metric> {
    let mut by_status = R::Status::ALL
        .iter()
        .map(|status| (*status, 0usize))
        .collect::<BTreeMap<_, _>>();
    let mut by_category = BTreeMap::new();

    for record in records {
        *by_status.entry(record.status()).or_insert(0) += 1;
        if let Some(category) = record.category() {
            *by_category.entry(category.to_owned()).or_insert(0) += 1;
        }
    }

    let metrics = metrics
        .iter()
        .map(|metric| {
            (
                *metric,
                Aggregate::from_values(records.iter().map(|record| record.metric(*metric))),
            )
        })
        .collect();

    DerivedStats {
        total: records.len(),
        by_status,
        by_category,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use outpost_domain::{
        ApiKey, ApiKeyMetric, ApiKeyStatus, Endpoint, EndpointMetric, EndpointStatus, RecordId,
    };
    use proptest::prelude::*;

    use super::*;

    fn endpoint(index: usize, status: EndpointStatus, risk_score: u32) -> Endpoint {
        Endpoint {
            id: RecordId::sequenced("ep", index as u64),
            hostname: format!("HOST-{index:02}"),
            ip_address: format!("10.0.0.{index}"),
            platform: if index % 2 == 0 { "linux" } else { "windows" }.to_owned(),
            os_version: None,
            status,
            risk_score,
            open_alerts: 1,
            last_seen: None,
        }
    }

    #[test]
    fn empty_collection_averages_to_zero() {
        let stats = compute_stats::<Endpoint>(&[], EndpointMetric::ALL);
        assert_eq!(stats.total, 0);
        for metric in EndpointMetric::ALL {
            let aggregate = stats.aggregate(*metric);
            assert_eq!(aggregate.average, 0.0);
            assert!(!aggregate.average.is_nan());
            assert_eq!(aggregate.count, 0);
        }
        assert!(stats.by_status.values().all(|count| *count == 0));
        assert_eq!(stats.by_status.len(), EndpointStatus::ALL.len());
    }

    #[test]
    fn counts_sums_and_averages() {
        let records = vec![
            endpoint(0, EndpointStatus::Online, 40),
            endpoint(1, EndpointStatus::Online, 80),
            endpoint(2, EndpointStatus::Isolated, 90),
            endpoint(3, EndpointStatus::Wiped, 10),
        ];

        let stats = compute_stats(&records, &[EndpointMetric::RiskScore]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(EndpointStatus::Online), 2);
        assert_eq!(stats.count(EndpointStatus::Offline), 0);
        assert_eq!(stats.terminal_count(), 1);
        assert_eq!(stats.category_count("linux"), 2);
        assert_eq!(stats.category_count("windows"), 2);
        let risk = stats.aggregate(EndpointMetric::RiskScore);
        assert_eq!(risk.sum, 220.0);
        assert_eq!(risk.average, 55.0);
        assert_eq!(stats.aggregate(EndpointMetric::OpenAlerts), Aggregate::default());
    }

    #[test]
    fn api_key_request_totals() {
        let key = |id: &str, status, request_count| ApiKey {
            id: RecordId::from(id),
            name: id.to_owned(),
            key_prefix: "oz_live".to_owned(),
            scope: "read".to_owned(),
            status,
            request_count,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            last_used_at: None,
        };
        let records = vec![
            key("key-1", ApiKeyStatus::Active, 100),
            key("key-2", ApiKeyStatus::Revoked, 50),
        ];
        let stats = compute_stats(&records, ApiKeyMetric::ALL);
        assert_eq!(stats.aggregate(ApiKeyMetric::RequestCount).sum, 150.0);
        assert_eq!(stats.count(ApiKeyStatus::Active), 1);
        assert_eq!(stats.count(ApiKeyStatus::Expired), 0);
    }

    proptest! {
        #[test]
        fn status_buckets_partition_the_collection(
            rows in prop::collection::vec(
                (prop::sample::select(EndpointStatus::ALL.to_vec()), 0u32..100),
                0..40,
            )
        ) {
            let records = rows
                .into_iter()
                .enumerate()
                .map(|(index, (status, risk))| endpoint(index, status, risk))
                .collect::<Vec<_>>();
            let stats = compute_stats(&records, EndpointMetric::ALL);
            prop_assert_eq!(stats.by_status.values().sum::<usize>(), records.len());
            prop_assert_eq!(stats.by_category.values().sum::<usize>(), records.len());
            prop_assert!(!stats.aggregate(EndpointMetric::RiskScore).average.is_nan());
        }
    }
}
