//! WAPT collector: one inventory walk per scrape.
//!
//! The collector keeps no state between scrapes. Each call to
//! [`WaptCollector::collect`] pings the server, then fetches and counts
//! hosts and packages, pushing gauge samples into the caller's sink as it
//! goes. A failed step ends the scrape early: a dead server yields only
//! `wapt_up 0`, never zero-valued host counts that would read as "no hosts".

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use wapt_inventory::{HostRecord, InventoryApi};

/// Prefix of every exported metric name.
pub const NAMESPACE: &str = "wapt";

/// Static description of one exported gauge.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name without the namespace prefix.
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Fully qualified name as scraped, e.g. `wapt_up`.
    pub fn fq_name(&self) -> String {
        format!("{NAMESPACE}_{}", self.name)
    }
}

pub static UP: MetricDesc = MetricDesc {
    name: "up",
    help: "Whether the WAPT server answered its ping (1) or not (0)",
    labels: &[],
};

pub static HOSTS: MetricDesc = MetricDesc {
    name: "hosts",
    help: "Registered hosts by reachability and agent version",
    labels: &["reachable", "version"],
};

pub static PACKAGES: MetricDesc = MetricDesc {
    name: "packages",
    help: "Packages in the server's local repository",
    labels: &[],
};

/// Every gauge the collector may emit.
pub static CATALOG: [&MetricDesc; 3] = [&UP, &HOSTS, &PACKAGES];

/// One gauge observation emitted during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: &'static MetricDesc,
    /// Values in the same order as `desc.labels`.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn gauge(desc: &'static MetricDesc, label_values: Vec<String>, value: f64) -> Self {
        Self {
            desc,
            label_values,
            value,
        }
    }
}

/// Bucket key for `wapt_hosts`: agent version, then reachability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregationKey {
    pub version: String,
    pub reachable: String,
}

/// Count hosts per (version, reachability) bucket.
///
/// Only buckets with at least one host appear in the result, and the
/// counts always sum to `hosts.len()`.
pub fn aggregate_hosts(hosts: &[HostRecord]) -> BTreeMap<AggregationKey, u64> {
    let mut buckets = BTreeMap::new();
    for host in hosts {
        let key = AggregationKey {
            version: host.wapt_version.clone(),
            reachable: host.reachable.clone(),
        };
        *buckets.entry(key).or_insert(0) += 1;
    }
    buckets
}

/// Produces the WAPT gauges on demand.
pub struct WaptCollector<C> {
    client: Arc<C>,
}

impl<C: InventoryApi> WaptCollector<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Metric descriptions, for registration and rendering.
    pub fn describe(&self) -> &'static [&'static MetricDesc] {
        &CATALOG
    }

    /// Run one scrape, appending samples to `sink`.
    pub async fn collect(&self, sink: &mut Vec<Sample>) {
        let start = sink.len();

        let up = self.client.check_liveness().await;
        sink.push(Sample::gauge(&UP, Vec::new(), if up { 1.0 } else { 0.0 }));
        if !up {
            return;
        }

        let Ok(hosts) = self.client.list_hosts().await else {
            return;
        };
        let buckets = aggregate_hosts(&hosts);
        debug!(hosts = hosts.len(), buckets = buckets.len(), "hosts aggregated");
        for (key, count) in buckets {
            sink.push(Sample::gauge(
                &HOSTS,
                vec![key.reachable, key.version],
                count as f64,
            ));
        }

        if let Ok(packages) = self.client.list_packages().await {
            sink.push(Sample::gauge(&PACKAGES, Vec::new(), packages.len() as f64));
        }

        debug!(samples = sink.len() - start, "scrape collected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wapt_inventory::{InventoryError, InventoryResult, PackageRecord, PingInfo};

    /// Scripted inventory. `None` makes the matching call fail.
    struct FakeInventory {
        up: bool,
        hosts: Option<Vec<HostRecord>>,
        packages: Option<Vec<PackageRecord>>,
        calls: std::sync::Mutex<Vec<&'static str>>,
    }

    impl FakeInventory {
        fn new(up: bool, hosts: Option<Vec<HostRecord>>, packages: Option<Vec<PackageRecord>>) -> Self {
            Self {
                up,
                hosts,
                packages,
                calls: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl InventoryApi for FakeInventory {
        async fn ping(&self) -> InventoryResult<PingInfo> {
            self.calls.lock().unwrap().push("ping");
            if self.up {
                Ok(PingInfo { version: "2.5.4".into() })
            } else {
                Err(InventoryError::Transport("connection refused".into()))
            }
        }

        async fn list_hosts(&self) -> InventoryResult<Vec<HostRecord>> {
            self.calls.lock().unwrap().push("hosts");
            self.hosts
                .clone()
                .ok_or_else(|| InventoryError::Decode("expected value".into()))
        }

        async fn list_packages(&self) -> InventoryResult<Vec<PackageRecord>> {
            self.calls.lock().unwrap().push("packages");
            self.packages.clone().ok_or(InventoryError::Rejected {
                msg: "denied".into(),
            })
        }
    }

    fn host(version: &str, reachable: &str) -> HostRecord {
        HostRecord {
            uuid: format!("{version}-{reachable}"),
            host_status: "OK".into(),
            reachable: reachable.into(),
            wapt_version: version.into(),
        }
    }

    fn package(name: &str) -> PackageRecord {
        PackageRecord {
            package: name.into(),
            version: "1.0-1".into(),
        }
    }

    async fn scrape(fake: FakeInventory) -> (Vec<Sample>, Vec<&'static str>) {
        let fake = Arc::new(fake);
        let collector = WaptCollector::new(fake.clone());
        let mut sink = Vec::new();
        collector.collect(&mut sink).await;
        (sink, fake.calls())
    }

    fn host_samples(samples: &[Sample]) -> Vec<&Sample> {
        samples.iter().filter(|s| s.desc == &HOSTS).collect()
    }

    #[tokio::test]
    async fn dead_server_emits_only_up_zero() {
        let (samples, calls) = scrape(FakeInventory::new(false, Some(vec![host("1.0", "OK")]), Some(vec![]))).await;

        assert_eq!(samples, vec![Sample::gauge(&UP, vec![], 0.0)]);
        assert_eq!(calls, vec!["ping"]);
    }

    #[tokio::test]
    async fn failed_host_listing_emits_only_up_one() {
        let (samples, calls) = scrape(FakeInventory::new(true, None, Some(vec![package("a")]))).await;

        assert_eq!(samples, vec![Sample::gauge(&UP, vec![], 1.0)]);
        assert_eq!(calls, vec!["ping", "hosts"]);
    }

    #[tokio::test]
    async fn buckets_by_version_and_reachability() {
        let hosts = vec![host("1.0", "OK"), host("1.0", "OK"), host("2.0", "FAIL")];
        let (samples, _) = scrape(FakeInventory::new(true, Some(hosts), None)).await;

        assert_eq!(samples[0], Sample::gauge(&UP, vec![], 1.0));
        let hosts = host_samples(&samples);
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains(&&Sample::gauge(&HOSTS, vec!["OK".into(), "1.0".into()], 2.0)));
        assert!(hosts.contains(&&Sample::gauge(&HOSTS, vec!["FAIL".into(), "2.0".into()], 1.0)));
    }

    #[tokio::test]
    async fn empty_host_list_emits_no_buckets() {
        let (samples, _) = scrape(FakeInventory::new(true, Some(vec![]), None)).await;

        assert_eq!(samples, vec![Sample::gauge(&UP, vec![], 1.0)]);
    }

    #[tokio::test]
    async fn packages_are_counted() {
        let packages = vec![package("tis-firefox"), package("tis-7zip"), package("tis-vlc")];
        let (samples, calls) =
            scrape(FakeInventory::new(true, Some(vec![host("2.5", "OK")]), Some(packages))).await;

        assert_eq!(calls, vec!["ping", "hosts", "packages"]);
        assert_eq!(samples.last(), Some(&Sample::gauge(&PACKAGES, vec![], 3.0)));
    }

    #[tokio::test]
    async fn failed_package_listing_keeps_host_samples() {
        let (samples, _) =
            scrape(FakeInventory::new(true, Some(vec![host("2.5", "OK")]), None)).await;

        assert_eq!(samples.len(), 2);
        assert_eq!(host_samples(&samples).len(), 1);
        assert!(samples.iter().all(|s| s.desc != &PACKAGES));
    }

    #[tokio::test]
    async fn host_counts_sum_to_record_count() {
        let hosts: Vec<HostRecord> = (0..57)
            .map(|i| host(["2.4", "2.5", "2.6"][i % 3], ["OK", "UNREACHABLE"][i % 2]))
            .collect();
        let (samples, _) = scrape(FakeInventory::new(true, Some(hosts), Some(vec![]))).await;

        let total: f64 = host_samples(&samples).iter().map(|s| s.value).sum();
        assert_eq!(total, 57.0);
    }

    #[tokio::test]
    async fn collect_appends_to_existing_sink() {
        let collector = WaptCollector::new(Arc::new(FakeInventory::new(false, None, None)));
        let mut sink = vec![Sample::gauge(&PACKAGES, vec![], 9.0)];
        collector.collect(&mut sink).await;

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1], Sample::gauge(&UP, vec![], 0.0));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut hosts = vec![
            host("1.0", "OK"),
            host("2.0", "FAIL"),
            host("1.0", "OK"),
            host("1.0", "UNREACHABLE"),
            host("2.0", "OK"),
        ];
        let forward = aggregate_hosts(&hosts);
        hosts.reverse();
        assert_eq!(aggregate_hosts(&hosts), forward);
        hosts.rotate_left(2);
        assert_eq!(aggregate_hosts(&hosts), forward);
    }

    #[test]
    fn aggregation_keeps_empty_labels_as_own_bucket() {
        let buckets = aggregate_hosts(&[host("", ""), host("", ""), host("2.5", "OK")]);
        let empty = AggregationKey {
            version: String::new(),
            reachable: String::new(),
        };
        assert_eq!(buckets.get(&empty), Some(&2));
        assert_eq!(buckets.values().sum::<u64>(), 3);
    }

    #[test]
    fn catalog_names() {
        let collector = WaptCollector::new(Arc::new(FakeInventory::new(true, None, None)));
        let names: Vec<String> = collector.describe().iter().map(|d| d.fq_name()).collect();
        assert_eq!(names, vec!["wapt_up", "wapt_hosts", "wapt_packages"]);
        assert_eq!(HOSTS.labels, &["reachable", "version"]);
    }
}
