//! Prometheus text exposition format.
//!
//! Samples from one scrape are loaded into a throwaway registry and
//! encoded with the `prometheus` crate, so concurrent scrapes never share
//! gauge state. Families without samples are left out of the output.

use ::prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::collector::{MetricDesc, NAMESPACE, Sample};

struct Families {
    registry: Registry,
    gauges: Vec<(&'static MetricDesc, GaugeVec)>,
}

fn register(catalog: &[&'static MetricDesc]) -> ::prometheus::Result<Families> {
    let registry = Registry::new();
    let mut gauges = Vec::with_capacity(catalog.len());
    for &desc in catalog {
        let gauge = GaugeVec::new(Opts::new(desc.name, desc.help).namespace(NAMESPACE), desc.labels)?;
        registry.register(Box::new(gauge.clone()))?;
        gauges.push((desc, gauge));
    }
    Ok(Families { registry, gauges })
}

/// Check that every catalog entry is a valid, unique Prometheus gauge.
///
/// Run once at startup; rendering cannot succeed if this fails.
pub fn check_catalog(catalog: &[&'static MetricDesc]) -> ::prometheus::Result<()> {
    register(catalog).map(|_| ())
}

/// Render the samples of one scrape into Prometheus text format.
pub fn render_prometheus(
    catalog: &[&'static MetricDesc],
    samples: &[Sample],
) -> ::prometheus::Result<String> {
    let families = register(catalog)?;

    for sample in samples {
        let Some((_, gauge)) = families.gauges.iter().find(|(desc, _)| *desc == sample.desc) else {
            warn!(metric = %sample.desc.fq_name(), "sample for unknown metric dropped");
            continue;
        };
        let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
        gauge.get_metric_with_label_values(&values)?.set(sample.value);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families.registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ::prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CATALOG, HOSTS, PACKAGES, UP};

    fn hosts(reachable: &str, version: &str, count: f64) -> Sample {
        Sample::gauge(&HOSTS, vec![reachable.into(), version.into()], count)
    }

    #[test]
    fn render_empty() {
        let output = render_prometheus(&CATALOG, &[]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn render_down() {
        let output = render_prometheus(&CATALOG, &[Sample::gauge(&UP, vec![], 0.0)]).unwrap();

        assert!(output.contains("# HELP wapt_up "));
        assert!(output.contains("# TYPE wapt_up gauge"));
        assert!(output.lines().any(|l| l == "wapt_up 0"));
        assert!(!output.contains("wapt_hosts"));
        assert!(!output.contains("wapt_packages"));
    }

    #[test]
    fn render_full_scrape() {
        let samples = vec![
            Sample::gauge(&UP, vec![], 1.0),
            hosts("OK", "1.0", 2.0),
            hosts("FAIL", "2.0", 1.0),
            Sample::gauge(&PACKAGES, vec![], 42.0),
        ];
        let output = render_prometheus(&CATALOG, &samples).unwrap();

        assert!(output.lines().any(|l| l == "wapt_up 1"));
        assert!(output.lines().any(|l| l == r#"wapt_hosts{reachable="OK",version="1.0"} 2"#));
        assert!(output.lines().any(|l| l == r#"wapt_hosts{reachable="FAIL",version="2.0"} 1"#));
        assert!(output.lines().any(|l| l == "wapt_packages 42"));
        assert!(output.contains("# TYPE wapt_hosts gauge"));
    }

    #[test]
    fn label_values_are_escaped() {
        let output = render_prometheus(&CATALOG, &[hosts("OK", "2.5\"beta", 1.0)]).unwrap();
        assert!(output.contains(r#"version="2.5\"beta""#));
    }

    #[test]
    fn wrong_label_count_is_an_error() {
        let bad = Sample::gauge(&HOSTS, vec!["OK".into()], 1.0);
        assert!(render_prometheus(&CATALOG, &[bad]).is_err());
    }

    #[test]
    fn unknown_metric_is_dropped() {
        let output =
            render_prometheus(&[&UP], &[Sample::gauge(&PACKAGES, vec![], 3.0)]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn catalog_is_valid() {
        check_catalog(&CATALOG).unwrap();
    }

    #[test]
    fn invalid_catalog_is_rejected() {
        static BAD: MetricDesc = MetricDesc {
            name: "bad-name",
            help: "not a valid metric name",
            labels: &[],
        };
        assert!(check_catalog(&[&BAD]).is_err());
        assert!(check_catalog(&[&UP, &UP]).is_err());
    }

    #[test]
    fn every_sample_line_is_well_formed() {
        let samples = vec![Sample::gauge(&UP, vec![], 1.0), hosts("OK", "2.5.4", 7.0)];
        let output = render_prometheus(&CATALOG, &samples).unwrap();

        // Every non-comment line should be: metric_name[{labels}] value
        for line in output.lines().filter(|l| !l.is_empty() && !l.starts_with('#')) {
            let (name, value) = line.rsplit_once(' ').unwrap();
            assert!(name.starts_with("wapt_"), "unexpected metric: {line}");
            value.parse::<f64>().unwrap();
        }
    }
}
