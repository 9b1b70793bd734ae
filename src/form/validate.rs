//! Form validation and payload synthesis
//!
//! Validation inspects the raw entered strings and returns per-field
//! messages. Synthesis turns the entered strings into the values the
//! dispatcher sends, filling min/max gaps from resolved statistics,
//! folding the calories scratch keys into one object and applying
//! declared defaults.

use serde::Serialize;
use std::collections::HashMap;

use crate::constants::{CALORIES_DEFAULT_MAX, CALORIES_MAX_KEY, CALORIES_MIN_KEY};
use crate::form::controls::zero_coalesce;
use crate::form::pairing::RangePair;
use crate::spec::document::{value_to_string, EndpointSpec};
use crate::spec::stats::resolve_statistics;

const RANGE_ERROR: &str = "Min > Max";

/// A value ready for dispatch
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Range { min: f64, max: f64 },
}

impl ParamValue {
    /// Rendering used when the value lands in a query string; range
    /// values serialize as one compact JSON object
    pub fn query_value(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            range => serde_json::to_string(range).unwrap_or_default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Text(text) => text.trim().is_empty(),
            ParamValue::Range { .. } => false,
        }
    }
}

/// Checks the entered values against the endpoint's rules. Returns a
/// map from parameter name to message; an empty map means dispatch may
/// proceed.
pub fn validate_form(
    endpoint: &EndpointSpec,
    pairs: &[RangePair],
    values: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut errors: HashMap<String, String> = HashMap::new();

    // calories_per_day is synthesized later, so it is exempt from the
    // required check by name
    for param in &endpoint.parameters {
        if !param.required || param.name == "calories_per_day" {
            continue;
        }
        let blank = values
            .get(&param.name)
            .map(|value| value.trim().is_empty())
            .unwrap_or(true);
        if blank {
            errors.insert(param.name.clone(), format!("{} is required", param.name));
        }
    }

    // A non-blank days value must be a whole number above zero; a value
    // that fails to parse is an error, not a pass
    if let Some(raw) = values.get("days") {
        if !raw.trim().is_empty() {
            match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => {}
                _ => {
                    errors.insert(
                        "days".to_string(),
                        "Days must be greater than 0".to_string(),
                    );
                }
            }
        }
    }

    check_range(values, &mut errors, "minEnergy", "maxEnergy");
    check_range(values, &mut errors, CALORIES_MIN_KEY, CALORIES_MAX_KEY);
    for pair in pairs {
        if let (Some(min_name), Some(max_name)) = (&pair.min_name, &pair.max_name) {
            check_range(values, &mut errors, min_name, max_name);
        }
    }

    errors
}

/// Records a range error under both member keys when both values are
/// present and the lower bound exceeds the upper. Blank or unparseable
/// members leave the pair unchecked, and equal bounds are valid.
fn check_range(
    values: &HashMap<String, String>,
    errors: &mut HashMap<String, String>,
    min_key: &str,
    max_key: &str,
) {
    if let (Some(min), Some(max)) = (parsed(values, min_key), parsed(values, max_key)) {
        if min > max {
            errors.insert(min_key.to_string(), RANGE_ERROR.to_string());
            errors.insert(max_key.to_string(), RANGE_ERROR.to_string());
        }
    }
}

fn parsed(values: &HashMap<String, String>, key: &str) -> Option<f64> {
    let raw = values.get(key)?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

/// Builds the outgoing value map from the entered values:
///
/// 1. every min/max-named parameter without a value gets its resolved
///    bound injected as a string, zero-coalescing to 0 and 100
/// 2. for endpoints declaring `calories_per_day`, the scratch keys are
///    folded into one range object and removed from the payload
/// 3. parameters still without a value take their declared default,
///    stringified
pub fn synthesize_values(
    endpoint: &EndpointSpec,
    values: &HashMap<String, String>,
) -> HashMap<String, ParamValue> {
    let mut payload: HashMap<String, ParamValue> = values
        .iter()
        .map(|(name, value)| (name.clone(), ParamValue::Text(value.clone())))
        .collect();

    for param in &endpoint.parameters {
        let lowered = param.name.to_lowercase();
        if !lowered.contains("min") && !lowered.contains("max") {
            continue;
        }
        if !blank_entry(&payload, &param.name) {
            continue;
        }
        let stats = resolve_statistics(param, endpoint);
        let bound = if lowered.contains("min") {
            zero_coalesce(stats.min, 0.0)
        } else {
            zero_coalesce(stats.max, 100.0)
        };
        payload.insert(param.name.clone(), ParamValue::Text(format!("{}", bound)));
    }

    if endpoint.has_parameter("calories_per_day") {
        let min = scratch_bound(values, CALORIES_MIN_KEY, 0.0);
        let max = scratch_bound(values, CALORIES_MAX_KEY, CALORIES_DEFAULT_MAX);
        payload.remove(CALORIES_MIN_KEY);
        payload.remove(CALORIES_MAX_KEY);
        payload.insert(
            "calories_per_day".to_string(),
            ParamValue::Range { min, max },
        );
    }

    for param in &endpoint.parameters {
        if param.name == "calories_per_day" {
            continue;
        }
        if !blank_entry(&payload, &param.name) {
            continue;
        }
        if let Some(default) = &param.default {
            payload.insert(
                param.name.clone(),
                ParamValue::Text(value_to_string(default)),
            );
        }
    }

    payload
}

/// Missing entry or exact empty string, the two states synthesis
/// treats as "no value entered"
fn blank_entry(payload: &HashMap<String, ParamValue>, name: &str) -> bool {
    match payload.get(name) {
        None => true,
        Some(ParamValue::Text(text)) => text.is_empty(),
        Some(ParamValue::Range { .. }) => false,
    }
}

fn scratch_bound(values: &HashMap<String, String>, key: &str, default: f64) -> f64 {
    values
        .get(key)
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
