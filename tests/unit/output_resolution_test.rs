// tests/unit/output_resolution_test.rs

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use alert_delivery_service::domain::error::DeliveryError;
use alert_delivery_service::domain::model::output::Output;
use alert_delivery_service::domain::model::severity::Severity;
use alert_delivery_service::repository::output_store::InMemoryOutputStore;
use alert_delivery_service::service::output_resolver::{resolve_batch, resolve_for_destinations, resolve_outputs};
use alert_delivery_service::service::outputs_cache::OutputsCache;
use common::{rule_alert, webhook_output};

fn ids(outputs: &[Output]) -> HashSet<String> {
    outputs.iter().map(|o| o.output_id.clone()).collect()
}

fn catalog() -> Vec<Output> {
    vec![
        webhook_output("info-only", &[Severity::Info]),
        webhook_output("low-med", &[Severity::Low, Severity::Medium]),
        webhook_output("urgent", &[Severity::High, Severity::Critical]),
        webhook_output("everything", &Severity::ALL),
        webhook_output("manual", &[]),
    ]
}

#[test]
fn defaults_match_exactly_the_outputs_listing_the_severity() {
    let cache = catalog();
    for severity in Severity::ALL {
        let resolved = resolve_outputs(&rule_alert("a", severity, &[]), &cache);
        let expected: HashSet<String> = cache
            .iter()
            .filter(|o| o.default_for_severity.contains(&severity))
            .map(|o| o.output_id.clone())
            .collect();
        assert_eq!(ids(&resolved), expected, "severity {severity}");
        assert!(!ids(&resolved).contains("manual"));
    }
}

#[test]
fn info_alert_goes_to_info_output_only() {
    let cache = vec![webhook_output("X", &[Severity::Info]), webhook_output("Y", &[Severity::Medium])];
    let resolved = resolve_outputs(&rule_alert("a", Severity::Info, &[]), &cache);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].output_id, "X");
}

#[test]
fn overrides_resolve_to_the_cache_intersection() {
    let cache = catalog();
    let alert = rule_alert("a", Severity::Info, &["manual", "urgent", "deleted"]);
    let resolved = resolve_outputs(&alert, &cache);
    assert_eq!(ids(&resolved), HashSet::from(["manual".to_string(), "urgent".to_string()]));
}

#[test]
fn batch_resolution_keeps_every_alert() {
    let cache = catalog();
    let map = resolve_batch(
        vec![
            rule_alert("a", Severity::Info, &[]),
            rule_alert("b", Severity::High, &["deleted"]),
        ],
        &cache,
    );
    assert_eq!(map.len(), 2);
    assert_eq!(ids(&map[0].1), HashSet::from(["info-only".to_string(), "everything".to_string()]));
    assert!(map[1].1.is_empty());
}

#[test]
fn strict_resolution_fails_when_nothing_matches() {
    let err = resolve_for_destinations(vec![rule_alert("a", Severity::Low, &[])], &catalog(), &["deleted".to_string()])
        .unwrap_err();
    assert!(matches!(err, DeliveryError::InvalidInput { .. }));
}

#[tokio::test(start_paused = true)]
async fn repeated_resolution_within_refresh_window_fetches_once() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryOutputStore::new(catalog()));
    let cache = OutputsCache::new(store.clone(), Duration::from_secs(300));

    for i in 0..5 {
        let outputs = cache.get().await?;
        let resolved = resolve_outputs(&rule_alert(&i.to_string(), Severity::Critical, &[]), &outputs);
        assert_eq!(resolved.len(), 2);
        tokio::time::advance(Duration::from_secs(30)).await;
    }
    assert_eq!(store.fetch_count(), 1);

    tokio::time::advance(Duration::from_secs(300)).await;
    cache.get().await?;
    assert_eq!(store.fetch_count(), 2);
    Ok(())
}
