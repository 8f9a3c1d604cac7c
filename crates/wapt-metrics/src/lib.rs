//! wapt-metrics: WAPT inventory gauges for Prometheus.
//!
//! Nothing is cached or polled in the background. Every scrape runs the
//! collector once and renders what it emitted.
//!
//! # Architecture
//!
//! ```text
//! WaptCollector<C: InventoryApi>
//!   ├── describe() → metric catalog (wapt_up, wapt_hosts, wapt_packages)
//!   └── collect()  → ping ─ok→ hosts ─ok→ aggregate ─→ packages
//!                      │          │
//!                      └─fail─────┴─→ stop (samples so far are kept)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the telemetry endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{
    AggregationKey, CATALOG, HOSTS, MetricDesc, NAMESPACE, PACKAGES, Sample, UP, WaptCollector,
    aggregate_hosts,
};
pub use self::prometheus::{check_catalog, render_prometheus};
