//! Field statistics resolution
//!
//! Parameters like `minCalories`/`maxCalories` carry no bounds of their
//! own; the numbers live in `x-statistics` and `x-enum-values` entries
//! scattered over the endpoint and its sibling parameters. The resolver
//! walks those sources in a fixed order and always comes back with a
//! usable set of statistics.

use regex::Regex;
use std::sync::OnceLock;

use crate::spec::document::{EndpointSpec, FieldStats, ParameterSpec};

/// Normalizes a field name for matching: lowercased with whitespace,
/// hyphens, underscores and parentheses removed
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '(' | ')'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Key a parameter resolves statistics under: a leading min/max marker
/// is dropped, then the remainder is normalized
pub fn resolver_key(name: &str) -> String {
    static LEADING_BOUND: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_BOUND.get_or_init(|| Regex::new(r"(?i)^(min|max)").unwrap());
    normalize_field_name(&re.replace(name, ""))
}

/// Resolves the statistics behind a parameter. Sources are consulted in
/// a fixed order: the parameter's own entry, endpoint statistics,
/// endpoint curated entries, a sibling parameter sharing the same base
/// name, then neutral fallback values.
pub fn resolve_statistics(param: &ParameterSpec, endpoint: &EndpointSpec) -> FieldStats {
    if let Some(own) = &param.x_statistics {
        return own.clone();
    }

    let target = resolver_key(&param.name);

    if let Some(hit) = match_field(&endpoint.x_statistics, &target) {
        return hit.clone();
    }
    if let Some(hit) = match_field(&endpoint.x_enum_values, &target) {
        return hit.clone();
    }

    for other in &endpoint.parameters {
        if other.name.eq_ignore_ascii_case(&param.name) {
            continue;
        }
        if resolver_key(&other.name) != target {
            continue;
        }
        if let Some(stats) = &other.x_statistics {
            return stats.clone();
        }
    }

    FieldStats::fallback()
}

/// First entry whose normalized field name matches the target exactly
/// or by substring in either direction
fn match_field<'a>(entries: &'a [FieldStats], target: &str) -> Option<&'a FieldStats> {
    entries.iter().find(|entry| match &entry.field {
        Some(field) => {
            let normalized = normalize_field_name(field);
            normalized == target || normalized.contains(target) || target.contains(&normalized)
        }
        None => false,
    })
}

/// Exact-field lookup used once a `field` value has been chosen.
/// Curated entries are scanned before statistics entries.
pub fn stats_for_selected_field<'a>(
    endpoint: &'a EndpointSpec,
    selected: &str,
) -> Option<&'a FieldStats> {
    endpoint
        .x_enum_values
        .iter()
        .chain(endpoint.x_statistics.iter())
        .find(|entry| entry.field.as_deref() == Some(selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::document::ParameterLocation;

    fn stats_entry(field: &str, min: f64, max: f64) -> FieldStats {
        FieldStats {
            field: Some(field.to_string()),
            min: Some(min),
            max: Some(max),
            avg: Some((min + max) / 2.0),
            mean: Some((min + max) / 2.0),
            std_dev: None,
            values: Vec::new(),
        }
    }

    #[test]
    fn normalization_drops_separators_and_case() {
        assert_eq!(normalize_field_name("Energy (kcal)"), "energykcal");
        assert_eq!(normalize_field_name("cook_time-Total"), "cooktimetotal");
        assert_eq!(normalize_field_name(""), "");
    }

    #[test]
    fn resolver_key_strips_only_the_leading_marker() {
        assert_eq!(resolver_key("minCalories"), "calories");
        assert_eq!(resolver_key("MAXCookTime"), "cooktime");
        assert_eq!(resolver_key("vitaminC"), "vitaminc");
        assert_eq!(resolver_key("calories"), "calories");
    }

    #[test]
    fn own_statistics_win() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![stats_entry("calories", 0.0, 500.0)];
        let mut param = ParameterSpec::new("minCalories", ParameterLocation::Query);
        param.x_statistics = Some(stats_entry("calories", 10.0, 90.0));
        endpoint.parameters = vec![param.clone()];

        let resolved = resolve_statistics(&param, &endpoint);
        assert_eq!(resolved.min, Some(10.0));
        assert_eq!(resolved.max, Some(90.0));
    }

    #[test]
    fn endpoint_statistics_match_by_substring_either_way() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![
            stats_entry("protein", 0.0, 80.0),
            stats_entry("calories", 0.0, 500.0),
        ];

        // target "cal" sits inside "calories"
        let short = ParameterSpec::new("minCal", ParameterLocation::Query);
        let resolved = resolve_statistics(&short, &endpoint);
        assert_eq!(resolved.max, Some(500.0));

        // "calories" sits inside target "caloriestotal"
        let long = ParameterSpec::new("maxCaloriesTotal", ParameterLocation::Query);
        let resolved = resolve_statistics(&long, &endpoint);
        assert_eq!(resolved.max, Some(500.0));
    }

    #[test]
    fn curated_entries_are_consulted_after_statistics() {
        let mut endpoint = EndpointSpec::new("GET", "/flavor");
        endpoint.x_enum_values = vec![FieldStats {
            field: Some("category".to_string()),
            values: vec!["Sweet".to_string(), "Bitter".to_string()],
            ..FieldStats::default()
        }];

        let param = ParameterSpec::new("category", ParameterLocation::Query);
        let resolved = resolve_statistics(&param, &endpoint);
        assert_eq!(resolved.field.as_deref(), Some("category"));
        assert_eq!(resolved.min, None);
        assert_eq!(resolved.values.len(), 2);
    }

    #[test]
    fn sibling_parameter_provides_statistics() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        let mut max_param = ParameterSpec::new("maxCookTime", ParameterLocation::Query);
        max_param.x_statistics = Some(stats_entry("cookTime", 5.0, 240.0));
        let min_param = ParameterSpec::new("minCookTime", ParameterLocation::Query);
        endpoint.parameters = vec![min_param.clone(), max_param];

        let resolved = resolve_statistics(&min_param, &endpoint);
        assert_eq!(resolved.min, Some(5.0));
        assert_eq!(resolved.max, Some(240.0));
    }

    #[test]
    fn resolution_is_repeatable_and_leaves_inputs_alone() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![stats_entry("calories", 0.0, 500.0)];
        let param = ParameterSpec::new("minCalories", ParameterLocation::Query);

        let first = resolve_statistics(&param, &endpoint);
        let second = resolve_statistics(&param, &endpoint);
        assert_eq!(first, second);
        assert_eq!(endpoint.x_statistics[0].max, Some(500.0));
    }

    #[test]
    fn unresolvable_parameter_gets_fallback() {
        let endpoint = EndpointSpec::new("GET", "/recipes");
        let param = ParameterSpec::new("minEnergy", ParameterLocation::Query);

        let resolved = resolve_statistics(&param, &endpoint);
        assert_eq!(resolved.min, Some(0.0));
        assert_eq!(resolved.max, Some(100.0));
        assert_eq!(resolved.avg, Some(50.0));
        assert_eq!(resolved.std_dev, Some(25.0));
    }

    #[test]
    fn selected_field_lookup_is_exact_and_prefers_curated() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![stats_entry("calories", 0.0, 500.0)];
        endpoint.x_enum_values = vec![FieldStats {
            field: Some("calories".to_string()),
            values: vec!["low".to_string()],
            ..FieldStats::default()
        }];

        let hit = stats_for_selected_field(&endpoint, "calories").unwrap();
        assert_eq!(hit.values, vec!["low"]);
        assert!(stats_for_selected_field(&endpoint, "Calories").is_none());
    }
}
