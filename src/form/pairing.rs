//! Min/max pair derivation
//!
//! Parameters whose names carry a "min"/"max" marker are folded into a
//! single range control per base name. The pair is derived, never
//! stored: it is recomputed from the parameter list when the active
//! endpoint changes.

use regex::Regex;
use std::sync::OnceLock;

use crate::spec::document::{EndpointSpec, FieldStats};
use crate::spec::stats::{normalize_field_name, resolve_statistics};

/// Two parameters forming one logical range control
#[derive(Clone, Debug, PartialEq)]
pub struct RangePair {
    /// Normalized grouping key, e.g. `carbs` for minCarbs/maxCarbs
    pub key: String,
    /// Label shown beside the combined control
    pub display_name: String,
    /// Field name the statistics resolved under, when one was found
    pub field: Option<String>,
    /// Name of the lower-bound parameter
    pub min_name: Option<String>,
    /// Name of the upper-bound parameter
    pub max_name: Option<String>,
    /// Statistics backing the pair's bounds
    pub stats: FieldStats,
}

impl RangePair {
    fn new(key: String) -> Self {
        RangePair {
            key,
            display_name: String::new(),
            field: None,
            min_name: None,
            max_name: None,
            stats: FieldStats::default(),
        }
    }

    /// Both bounds present; only complete pairs render as one control
    pub fn is_complete(&self) -> bool {
        self.min_name.is_some() && self.max_name.is_some()
    }

    /// The energy range has its own dedicated block and is skipped by
    /// generic pair rendering
    pub fn is_energy(&self) -> bool {
        self.min_name.as_deref() == Some("minEnergy")
            || self.max_name.as_deref() == Some("maxEnergy")
    }
}

fn strip_first_bound(name: &str) -> String {
    static ANY_BOUND: OnceLock<Regex> = OnceLock::new();
    let re = ANY_BOUND.get_or_init(|| Regex::new(r"(?i)(min|max)").unwrap());
    re.replace(name, "").into_owned()
}

/// Key a parameter groups under: the first min/max occurrence anywhere
/// in the name is dropped, then the remainder is normalized
pub fn pair_key(name: &str) -> String {
    normalize_field_name(&strip_first_bound(name))
}

/// Spaces out a camel-cased base name and capitalizes the first letter,
/// used when no field name could be resolved for the pair
fn humanize_base(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 4);
    for (i, c) in raw.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

/// Groups the endpoint's min/max parameters into range pairs, in first
/// encounter order.
///
/// A member's own `x-statistics` entry is adopted for the whole pair
/// (the last member carrying one wins). Pairs without an adopted entry
/// resolve statistics through the lower bound, or the upper one when no
/// lower bound exists.
pub fn derive_pairs(endpoint: &EndpointSpec) -> Vec<RangePair> {
    let mut pairs: Vec<RangePair> = Vec::new();
    let mut raw_bases: Vec<String> = Vec::new();
    let mut adopted: Vec<bool> = Vec::new();

    for param in &endpoint.parameters {
        let lowered = param.name.to_lowercase();
        let has_min = lowered.contains("min");
        let has_max = lowered.contains("max");
        if !has_min && !has_max {
            continue;
        }

        let key = pair_key(&param.name);
        let position = match pairs.iter().position(|p| p.key == key) {
            Some(pos) => pos,
            None => {
                pairs.push(RangePair::new(key));
                raw_bases.push(strip_first_bound(&param.name));
                adopted.push(false);
                pairs.len() - 1
            }
        };

        let pair = &mut pairs[position];
        if has_min {
            pair.min_name = Some(param.name.clone());
        } else {
            pair.max_name = Some(param.name.clone());
        }

        if let Some(stats) = &param.x_statistics {
            pair.stats = stats.clone();
            pair.field = stats.field.clone();
            adopted[position] = true;
        }
    }

    for (index, pair) in pairs.iter_mut().enumerate() {
        if !adopted[index] {
            let member = pair.min_name.as_deref().or(pair.max_name.as_deref());
            if let Some(name) = member {
                if let Some(param) = endpoint.parameter(name) {
                    let stats = resolve_statistics(param, endpoint);
                    pair.field = stats.field.clone();
                    pair.stats = stats;
                }
            }
        }

        pair.display_name = match &pair.field {
            Some(field) => field.clone(),
            None => humanize_base(&raw_bases[index]),
        };
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::document::{ParameterLocation, ParameterSpec};

    fn param(name: &str) -> ParameterSpec {
        ParameterSpec::new(name, ParameterLocation::Query)
    }

    fn param_with_stats(name: &str, field: &str, min: f64, max: f64) -> ParameterSpec {
        let mut p = param(name);
        p.x_statistics = Some(FieldStats {
            field: Some(field.to_string()),
            min: Some(min),
            max: Some(max),
            ..FieldStats::default()
        });
        p
    }

    #[test]
    fn groups_min_and_max_under_one_key() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![param("minCarbs"), param("maxCarbs"), param("limit")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].key, "carbs");
        assert!(pairs[0].is_complete());
        assert_eq!(pairs[0].min_name.as_deref(), Some("minCarbs"));
        assert_eq!(pairs[0].max_name.as_deref(), Some("maxCarbs"));
    }

    #[test]
    fn marker_anywhere_in_the_name_pairs_up() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![param("filterMinPrice"), param("filterMaxPrice")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].key, "filterprice");
        assert!(pairs[0].is_complete());
    }

    #[test]
    fn min_marker_wins_classification() {
        let mut endpoint = EndpointSpec::new("GET", "/scores");
        endpoint.parameters = vec![param("minMaxScore")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs[0].min_name.as_deref(), Some("minMaxScore"));
        assert_eq!(pairs[0].max_name, None);
        assert!(!pairs[0].is_complete());
    }

    #[test]
    fn last_member_with_own_statistics_wins() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![
            param_with_stats("minCarbs", "carbohydrates", 0.0, 50.0),
            param_with_stats("maxCarbs", "carbs", 0.0, 120.0),
        ];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs[0].field.as_deref(), Some("carbs"));
        assert_eq!(pairs[0].stats.max, Some(120.0));
        assert_eq!(pairs[0].display_name, "carbs");
    }

    #[test]
    fn unresolved_pair_gets_humanized_display_name() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![param("minCookTime"), param("maxCookTime")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs[0].field, None);
        assert_eq!(pairs[0].display_name, "Cook Time");
        // Fallback statistics still give the control usable bounds
        assert_eq!(pairs[0].stats.min, Some(0.0));
        assert_eq!(pairs[0].stats.max, Some(100.0));
    }

    #[test]
    fn endpoint_statistics_back_the_pair() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![FieldStats {
            field: Some("protein".to_string()),
            min: Some(0.0),
            max: Some(80.0),
            ..FieldStats::default()
        }];
        endpoint.parameters = vec![param("minProtein"), param("maxProtein")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs[0].field.as_deref(), Some("protein"));
        assert_eq!(pairs[0].stats.max, Some(80.0));
        assert_eq!(pairs[0].display_name, "protein");
    }

    #[test]
    fn energy_pair_is_flagged_but_kept() {
        let mut endpoint = EndpointSpec::new("GET", "/nutrition");
        endpoint.parameters = vec![param("minEnergy"), param("maxEnergy"), param("minFat")];

        let pairs = derive_pairs(&endpoint);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].is_energy());
        assert!(!pairs[1].is_energy());
        // First encounter order, not alphabetical
        assert_eq!(pairs[0].key, "energy");
        assert_eq!(pairs[1].key, "fat");
    }
}
