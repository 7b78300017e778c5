// src/service/output_resolver.rs
//! Output resolution: which outputs should receive an alert.
//!
//! - Alert with explicit `output_ids`: the cached outputs whose id is in that set
//!   (cache order; duplicates in the set collapse to one match).
//! - Alert without overrides: every cached output whose `default_for_severity` contains
//!   the alert severity.
//! - Caller-named destinations (`resolve_for_destinations`): the intersection of the
//!   caller's ids with the cached outputs; an empty intersection is invalid input.
//!
//! An empty result on the non-strict path is not an error: the alert simply has no destination.

use std::collections::HashSet;

use crate::domain::error::DeliveryError;
use crate::domain::model::alert::Alert;
use crate::domain::model::output::Output;

/// Alert paired with the outputs it resolved to. Recomputed on every dispatch cycle.
pub type AlertOutputMap = Vec<(Alert, Vec<Output>)>;

/// Outputs for one alert: overrides if present, severity defaults otherwise.
pub fn resolve_outputs(alert: &Alert, outputs: &[Output]) -> Vec<Output> {
    if !alert.output_ids.is_empty() {
        let wanted: HashSet<&str> = alert.output_ids.iter().map(String::as_str).collect();
        return outputs
            .iter()
            .filter(|o| wanted.contains(o.output_id.as_str()))
            .cloned()
            .collect();
    }

    outputs
        .iter()
        .filter(|o| o.is_default_for(alert.severity))
        .cloned()
        .collect()
}

/// Resolve a batch of alerts against one output snapshot.
pub fn resolve_batch(alerts: Vec<Alert>, outputs: &[Output]) -> AlertOutputMap {
    alerts
        .into_iter()
        .map(|alert| {
            let targets = resolve_outputs(&alert, outputs);
            (alert, targets)
        })
        .collect()
}

/// Strict variant for caller-named destinations: every alert goes to the outputs named in
/// `candidate_ids` that still exist. Fails fast if none of them exist.
pub fn resolve_for_destinations(
    alerts: Vec<Alert>,
    outputs: &[Output],
    candidate_ids: &[String],
) -> Result<AlertOutputMap, DeliveryError> {
    let wanted: HashSet<&str> = candidate_ids.iter().map(String::as_str).collect();
    let valid: Vec<Output> = outputs
        .iter()
        .filter(|o| wanted.contains(o.output_id.as_str()))
        .cloned()
        .collect();

    if valid.is_empty() {
        return Err(DeliveryError::invalid_input(format!(
            "none of the requested destinations exist: {}",
            candidate_ids.join(", ")
        )));
    }

    Ok(alerts.into_iter().map(|alert| (alert, valid.clone())).collect())
}
