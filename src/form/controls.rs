//! Control selection for endpoint parameters
//!
//! The widget for a parameter is picked by an ordered list of rules
//! evaluated top to bottom; the first matching rule wins and the order
//! is part of the contract. Most rules key on parameter names because
//! the upstream documents encode intent that way ("page", "limit",
//! "field", min/max markers) rather than through types.

use serde_json::{json, Map, Value};
use tracing::trace;

use crate::constants::{
    CALORIES_DEFAULT_MAX, CALORIES_MAX, CALORIES_MIN, ENERGY_FALLBACK_MAX, LIMIT_SLIDER_DEFAULT,
    LIMIT_SLIDER_MAX, LIMIT_SLIDER_MIN, SLIDER_MAX_PRECISION,
};
use crate::form::pairing::{pair_key, RangePair};
use crate::spec::document::{value_to_string, EndpointSpec, ParameterLocation, ParameterSpec};
use crate::spec::stats::{resolve_statistics, stats_for_selected_field};

/// Parameter names treated as integer-valued regardless of their
/// declared type
const INTEGER_PARAM_NAMES: &[&str] = &[
    "min",
    "max",
    "limit",
    "page",
    "page_size",
    "minCalories",
    "maxCalories",
    "minCarbs",
    "maxCarbs",
    "minEnergy",
    "maxEnergy",
];

/// What the form should draw for one parameter
#[derive(Clone, Debug, PartialEq)]
pub enum ControlDescriptor {
    /// Dropdown over the endpoint's available field names
    FieldSelect { options: Vec<String> },
    /// Dual-bound calories slider writing the two scratch keys
    CaloriesRange {
        min: f64,
        max: f64,
        default_max: f64,
    },
    /// JSON editor seeded with a template built from the body schema
    BodyEditor { template: String, helper: String },
    /// Dropdown over the declared enum values
    EnumSelect { options: Vec<String> },
    /// Digits-only page number box
    PageInput,
    /// Bounded integer slider for result-count limits
    LimitSlider { min: f64, max: f64, default: f64 },
    /// Member of a complete pair; the combined block draws it instead
    Suppressed,
    /// Continuous slider from the parameter's own statistics
    StatsSlider {
        min: f64,
        max: f64,
        default: f64,
        step: f64,
        placeholder: String,
    },
    /// Integer slider from resolved statistics
    IntSlider {
        min: f64,
        max: f64,
        default: f64,
        placeholder: String,
    },
    /// Search box restricted to a known value list
    SearchSelect { suggestions: Vec<String> },
    /// Comma separated free text for multi-valued parameters
    MultiText,
    /// Tag picker over a known value list
    MultiPick { suggestions: Vec<String> },
    /// Plain text box, with a suggestion popup when values are known
    TextInput {
        placeholder: String,
        suggestions: Vec<String>,
    },
}

/// Everything a rule may consult besides the parameter itself
pub struct ControlContext<'a> {
    pub endpoint: &'a EndpointSpec,
    pub pairs: &'a [RangePair],
}

type AppliesFn = fn(&ParameterSpec, &ControlContext) -> bool;
type BuildFn = fn(&ParameterSpec, &ControlContext) -> ControlDescriptor;

struct ControlRule {
    name: &'static str,
    applies: AppliesFn,
    build: BuildFn,
}

const CONTROL_RULES: &[ControlRule] = &[
    ControlRule {
        name: "field-select",
        applies: is_field_param,
        build: build_field_select,
    },
    ControlRule {
        name: "calories-range",
        applies: is_calories_per_day,
        build: build_calories_range,
    },
    ControlRule {
        name: "body-editor",
        applies: is_body_param,
        build: build_body_editor,
    },
    ControlRule {
        name: "enum-select",
        applies: has_declared_enum,
        build: build_enum_select,
    },
    ControlRule {
        name: "page-input",
        applies: is_page_param,
        build: build_page_input,
    },
    ControlRule {
        name: "limit-slider",
        applies: is_limit_param,
        build: build_limit_slider,
    },
    ControlRule {
        name: "pair-member",
        applies: is_complete_pair_member,
        build: build_suppressed,
    },
    ControlRule {
        name: "stats-slider",
        applies: has_own_statistics,
        build: build_stats_slider,
    },
    ControlRule {
        name: "int-slider",
        applies: is_plain_integer,
        build: build_int_slider,
    },
    ControlRule {
        name: "search-select",
        applies: is_searchable_single,
        build: build_search_select,
    },
    ControlRule {
        name: "multi-select",
        applies: is_multi_valued,
        build: build_multi_select,
    },
];

/// Picks the control for a parameter. Rules run in declaration order
/// and the first hit wins; everything else falls through to a plain
/// text input.
pub fn select_control(param: &ParameterSpec, ctx: &ControlContext) -> ControlDescriptor {
    for rule in CONTROL_RULES {
        if (rule.applies)(param, ctx) {
            trace!(param = %param.name, rule = rule.name, "selected form control");
            return (rule.build)(param, ctx);
        }
    }
    trace!(param = %param.name, rule = "text-input", "selected form control");
    build_text_input(param, ctx)
}

/// True for names on the integer list or containing one of its markers
pub fn is_integer_named(name: &str) -> bool {
    if INTEGER_PARAM_NAMES.contains(&name) {
        return true;
    }
    let lowered = name.to_lowercase();
    lowered.contains("min")
        || lowered.contains("max")
        || lowered.contains("limit")
        || lowered.contains("page")
}

fn is_field_param(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.name == "field"
}

fn is_calories_per_day(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.name == "calories_per_day"
}

fn is_body_param(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.location == ParameterLocation::Body
}

fn has_declared_enum(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    !param.enum_values.is_empty()
}

fn is_page_param(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.name == "page"
}

fn is_limit_param(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.name == "limit" || param.name == "page_size"
}

fn is_complete_pair_member(param: &ParameterSpec, ctx: &ControlContext) -> bool {
    let lowered = param.name.to_lowercase();
    if !lowered.contains("min") && !lowered.contains("max") {
        return false;
    }
    let key = pair_key(&param.name);
    ctx.pairs.iter().any(|p| p.key == key && p.is_complete())
}

fn has_own_statistics(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.x_statistics.is_some() && !is_integer_named(&param.name)
}

fn is_plain_integer(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    if !is_integer_named(&param.name) || param.name == "page" {
        return false;
    }
    let lowered = param.name.to_lowercase();
    !lowered.contains("min") && !lowered.contains("max")
}

fn is_searchable_single(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.is_single_select() && (!param.x_enum_values.is_empty() || param.name == "field")
}

fn is_multi_valued(param: &ParameterSpec, _ctx: &ControlContext) -> bool {
    param.is_multi_select()
}

fn build_field_select(param: &ParameterSpec, ctx: &ControlContext) -> ControlDescriptor {
    let options = if !param.x_enum_values.is_empty() {
        param.x_enum_values.clone()
    } else {
        ctx.endpoint.field_options()
    };
    ControlDescriptor::FieldSelect { options }
}

fn build_calories_range(_param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::CaloriesRange {
        min: CALORIES_MIN,
        max: CALORIES_MAX,
        default_max: CALORIES_DEFAULT_MAX,
    }
}

fn build_body_editor(_param: &ParameterSpec, ctx: &ControlContext) -> ControlDescriptor {
    let (template, helper) = body_template(ctx.endpoint);
    ControlDescriptor::BodyEditor { template, helper }
}

fn build_enum_select(param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::EnumSelect {
        options: param.enum_values.clone(),
    }
}

fn build_page_input(_param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::PageInput
}

fn build_limit_slider(_param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::LimitSlider {
        min: LIMIT_SLIDER_MIN as f64,
        max: LIMIT_SLIDER_MAX as f64,
        default: LIMIT_SLIDER_DEFAULT as f64,
    }
}

fn build_suppressed(_param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::Suppressed
}

fn build_stats_slider(param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    let stats = param.x_statistics.clone().unwrap_or_default();
    let min = stats.min.unwrap_or(0.0);
    let max = stats.max.unwrap_or(100.0);
    let default = first_nonzero(&[stats.avg, stats.mean]).unwrap_or(min);
    ControlDescriptor::StatsSlider {
        min,
        max,
        default,
        step: (max - min) / 100.0,
        placeholder: placeholder_for(param),
    }
}

fn build_int_slider(param: &ParameterSpec, ctx: &ControlContext) -> ControlDescriptor {
    let stats = resolve_statistics(param, ctx.endpoint);
    ControlDescriptor::IntSlider {
        min: zero_coalesce(stats.min, 0.0),
        max: zero_coalesce(stats.max, 100.0),
        default: first_nonzero(&[stats.mean, stats.avg]).unwrap_or(0.0),
        placeholder: placeholder_for(param),
    }
}

fn build_search_select(param: &ParameterSpec, ctx: &ControlContext) -> ControlDescriptor {
    let suggestions = if !param.x_enum_values.is_empty() {
        param.x_enum_values.clone()
    } else if param.name == "field" {
        ctx.endpoint.field_options()
    } else {
        Vec::new()
    };
    ControlDescriptor::SearchSelect { suggestions }
}

fn build_multi_select(param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    if param.x_enum_values.is_empty() {
        ControlDescriptor::MultiText
    } else {
        ControlDescriptor::MultiPick {
            suggestions: param.x_enum_values.clone(),
        }
    }
}

fn build_text_input(param: &ParameterSpec, _ctx: &ControlContext) -> ControlDescriptor {
    ControlDescriptor::TextInput {
        placeholder: placeholder_for(param),
        suggestions: param.suggestions(),
    }
}

fn placeholder_for(param: &ParameterSpec) -> String {
    param
        .example
        .as_ref()
        .map(value_to_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("Enter {}", param.name))
}

/// A combined dual-bound slider drawn once for a min/max pair
#[derive(Clone, Debug, PartialEq)]
pub struct PairControl {
    pub label: String,
    pub description: Option<String>,
    /// Value key of the lower bound
    pub min_key: String,
    /// Value key of the upper bound
    pub max_key: String,
    pub min_bound: f64,
    pub max_bound: f64,
    pub required: bool,
}

/// Builds the combined control for a generic pair.
///
/// When the endpoint declares a `field` parameter the bounds depend on
/// the chosen field: with nothing chosen the pair renders nothing, and
/// a chosen field relabels the control and re-matches its statistics by
/// exact field name.
pub fn pair_control(
    pair: &RangePair,
    endpoint: &EndpointSpec,
    selected_field: Option<&str>,
) -> Option<PairControl> {
    let min_name = pair.min_name.as_deref()?;
    let max_name = pair.max_name.as_deref()?;

    let mut label = pair.display_name.clone();
    let mut stats = &pair.stats;

    if endpoint.has_parameter("field") {
        let selected = selected_field.filter(|s| !s.is_empty())?;
        label = selected.to_string();
        if let Some(hit) = stats_for_selected_field(endpoint, selected) {
            stats = hit;
        }
    }

    let required = [min_name, max_name]
        .iter()
        .filter_map(|name| endpoint.parameter(name))
        .any(|p| p.required);

    Some(PairControl {
        label,
        description: None,
        min_key: min_name.to_string(),
        max_key: max_name.to_string(),
        min_bound: stats.min.unwrap_or(0.0),
        max_bound: stats.max.unwrap_or(100.0),
        required,
    })
}

/// Builds the dedicated energy block, present only when both bound
/// parameters exist. The oversized fallback ceiling applies here alone;
/// the resolver's own fallback never produces it.
pub fn energy_control(endpoint: &EndpointSpec) -> Option<PairControl> {
    let min_param = endpoint.parameter("minEnergy")?;
    let max_param = endpoint.parameter("maxEnergy")?;

    let stats = resolve_statistics(min_param, endpoint);
    Some(PairControl {
        label: "Energy (kcal)".to_string(),
        description: Some("Energy range in kilocalories".to_string()),
        min_key: min_param.name.clone(),
        max_key: max_param.name.clone(),
        min_bound: stats.min.unwrap_or(0.0),
        max_bound: stats.max.unwrap_or(ENERGY_FALLBACK_MAX),
        required: min_param.required || max_param.required,
    })
}

/// Builds the body editor template and helper text from the endpoint's
/// body schema. Properties prefer their declared example; otherwise a
/// typed zero value is used, and properties of unknown type are left
/// out of the template entirely.
pub fn body_template(endpoint: &EndpointSpec) -> (String, String) {
    let mut helper = String::from("Enter a valid JSON object for the request body");
    let schema = match &endpoint.body_schema {
        Some(schema) => schema,
        None => return ("{}".to_string(), helper),
    };

    let mut template = Map::new();
    for prop in &schema.properties {
        let value = match &prop.example {
            Some(example) => Some(example.clone()),
            None => match prop.prop_type.as_str() {
                "string" => Some(Value::String(String::new())),
                "number" | "integer" => Some(json!(0)),
                "boolean" => Some(Value::Bool(false)),
                "array" => Some(json!([])),
                "object" => Some(json!({})),
                _ => None,
            },
        };
        if let Some(value) = value {
            template.insert(prop.name.clone(), value);
        }

        if !prop.x_enum_values.is_empty() {
            helper.push_str(&format!(
                "\nOptions for {}: {}",
                prop.name,
                prop.x_enum_values.join(", ")
            ));
        }
        if let Some(stats) = &prop.x_statistics {
            helper.push_str(&format!(
                "\nRange for {}: {} - {}",
                prop.name,
                zero_coalesce(stats.min, 0.0),
                zero_coalesce(stats.max, 100.0)
            ));
        }
    }

    let rendered = serde_json::to_string_pretty(&Value::Object(template))
        .unwrap_or_else(|_| "{}".to_string());
    (rendered, helper)
}

/// First value that is present and not zero, mirroring the document's
/// or-chain defaulting
fn first_nonzero(candidates: &[Option<f64>]) -> Option<f64> {
    candidates.iter().find_map(|c| match c {
        Some(v) if *v != 0.0 => Some(*v),
        _ => None,
    })
}

/// Present-and-nonzero value, or the fallback
pub(super) fn zero_coalesce(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => fallback,
    }
}

/// Decimal precision shared by a slider's bounds, capped at four digits
pub fn decimal_precision(min: f64, max: f64) -> usize {
    fn decimals(v: f64) -> usize {
        let text = v.to_string();
        match text.split_once('.') {
            Some((_, frac)) => frac.len(),
            None => 0,
        }
    }
    decimals(min).max(decimals(max)).min(SLIDER_MAX_PRECISION)
}

/// Formats a slider value with the precision its bounds imply
pub fn format_number(value: f64, min: f64, max: f64) -> String {
    let precision = decimal_precision(min, max);
    if precision > 0 {
        format!("{:.*}", precision, value)
    } else {
        format!("{}", value.round())
    }
}

/// Text-input variant of [`format_number`]: blank or unparseable input
/// renders as an empty string
pub fn format_with_precision(value: &str, min: f64, max: f64) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) => format_number(parsed, min, max),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::pairing::derive_pairs;
    use crate::spec::document::{BodyProperty, BodySchema, FieldStats};

    fn query_param(name: &str) -> ParameterSpec {
        ParameterSpec::new(name, ParameterLocation::Query)
    }

    fn context<'a>(endpoint: &'a EndpointSpec, pairs: &'a [RangePair]) -> ControlContext<'a> {
        ControlContext { endpoint, pairs }
    }

    #[test]
    fn field_rule_beats_everything() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![FieldStats {
            field: Some("calories".to_string()),
            ..FieldStats::default()
        }];
        let mut param = query_param("field");
        param.enum_values = vec!["ignored".to_string()];
        param.collection_format = Some("single".to_string());
        endpoint.parameters = vec![param.clone()];

        let pairs = derive_pairs(&endpoint);
        match select_control(&param, &context(&endpoint, &pairs)) {
            ControlDescriptor::FieldSelect { options } => {
                assert_eq!(options, vec!["calories"]);
            }
            other => panic!("expected FieldSelect, got {:?}", other),
        }
    }

    #[test]
    fn calories_per_day_gets_the_fixed_range() {
        let endpoint = EndpointSpec::new("POST", "/mealplan");
        let param = query_param("calories_per_day");

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::CaloriesRange {
                min,
                max,
                default_max,
            } => {
                assert_eq!(min, 0.0);
                assert_eq!(max, 612_854.6);
                assert_eq!(default_max, 2000.0);
            }
            other => panic!("expected CaloriesRange, got {:?}", other),
        }
    }

    #[test]
    fn body_editor_builds_template_from_schema() {
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        endpoint.body_schema = Some(BodySchema {
            required: true,
            properties: vec![
                BodyProperty {
                    name: "days".to_string(),
                    prop_type: "integer".to_string(),
                    example: Some(json!(7)),
                    x_enum_values: Vec::new(),
                    x_statistics: None,
                },
                BodyProperty {
                    name: "diet".to_string(),
                    prop_type: "string".to_string(),
                    example: None,
                    x_enum_values: vec!["vegan".to_string(), "keto".to_string()],
                    x_statistics: None,
                },
                BodyProperty {
                    name: "mystery".to_string(),
                    prop_type: String::new(),
                    example: None,
                    x_enum_values: Vec::new(),
                    x_statistics: Some(FieldStats {
                        min: Some(0.0),
                        max: Some(4000.0),
                        ..FieldStats::default()
                    }),
                },
            ],
        });
        let param = ParameterSpec::new("plan", ParameterLocation::Body);

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::BodyEditor { template, helper } => {
                let parsed: Value = serde_json::from_str(&template).unwrap();
                assert_eq!(parsed["days"], json!(7));
                assert_eq!(parsed["diet"], json!(""));
                // Unknown property type stays out of the template
                assert!(parsed.get("mystery").is_none());
                assert!(helper.contains("Options for diet: vegan, keto"));
                assert!(helper.contains("Range for mystery: 0 - 4000"));
            }
            other => panic!("expected BodyEditor, got {:?}", other),
        }
    }

    #[test]
    fn body_editor_without_schema_offers_empty_object() {
        let endpoint = EndpointSpec::new("POST", "/recipes");
        let param = ParameterSpec::new("payload", ParameterLocation::Body);

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::BodyEditor { template, helper } => {
                assert_eq!(template, "{}");
                assert_eq!(helper, "Enter a valid JSON object for the request body");
            }
            other => panic!("expected BodyEditor, got {:?}", other),
        }
    }

    #[test]
    fn page_and_limit_rules_fire_before_integer_heuristics() {
        let endpoint = EndpointSpec::new("GET", "/recipes");

        let page = query_param("page");
        assert_eq!(
            select_control(&page, &context(&endpoint, &[])),
            ControlDescriptor::PageInput
        );

        let limit = query_param("limit");
        match select_control(&limit, &context(&endpoint, &[])) {
            ControlDescriptor::LimitSlider { min, max, default } => {
                assert_eq!((min, max, default), (1.0, 10.0, 10.0));
            }
            other => panic!("expected LimitSlider, got {:?}", other),
        }

        let page_size = query_param("page_size");
        assert!(matches!(
            select_control(&page_size, &context(&endpoint, &[])),
            ControlDescriptor::LimitSlider { .. }
        ));
    }

    #[test]
    fn complete_pair_members_are_suppressed() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![query_param("minCarbs"), query_param("maxCarbs")];
        let pairs = derive_pairs(&endpoint);

        let control = select_control(&endpoint.parameters[0], &context(&endpoint, &pairs));
        assert_eq!(control, ControlDescriptor::Suppressed);
    }

    #[test]
    fn lone_pair_member_falls_through_to_text() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![query_param("minPrice")];
        let pairs = derive_pairs(&endpoint);

        let control = select_control(&endpoint.parameters[0], &context(&endpoint, &pairs));
        assert!(matches!(control, ControlDescriptor::TextInput { .. }));
    }

    #[test]
    fn own_statistics_yield_a_continuous_slider() {
        let endpoint = EndpointSpec::new("GET", "/flavor");
        let mut param = query_param("sweetness");
        param.x_statistics = Some(FieldStats {
            min: Some(0.5),
            max: Some(9.5),
            avg: Some(0.0),
            mean: Some(4.2),
            ..FieldStats::default()
        });

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::StatsSlider {
                min,
                max,
                default,
                step,
                ..
            } => {
                assert_eq!(min, 0.5);
                assert_eq!(max, 9.5);
                // Zero average falls through to the mean
                assert_eq!(default, 4.2);
                assert!((step - 0.09).abs() < 1e-9);
            }
            other => panic!("expected StatsSlider, got {:?}", other),
        }
    }

    #[test]
    fn stats_slider_keeps_a_declared_zero_bound() {
        let endpoint = EndpointSpec::new("GET", "/flavor");
        let mut param = query_param("bitterness");
        param.x_statistics = Some(FieldStats {
            min: Some(0.0),
            max: Some(0.0),
            ..FieldStats::default()
        });

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::StatsSlider { min, max, default, .. } => {
                assert_eq!(min, 0.0);
                assert_eq!(max, 0.0);
                assert_eq!(default, 0.0);
            }
            other => panic!("expected StatsSlider, got {:?}", other),
        }
    }

    #[test]
    fn integer_named_parameter_uses_resolved_statistics() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![FieldStats {
            field: Some("pageDepth".to_string()),
            min: Some(1.0),
            max: Some(0.0),
            mean: Some(3.0),
            ..FieldStats::default()
        }];
        let param = query_param("pageDepth");
        endpoint.parameters = vec![param.clone()];

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::IntSlider {
                min, max, default, ..
            } => {
                assert_eq!(min, 1.0);
                // A zero upper bound is replaced here, unlike the
                // continuous slider
                assert_eq!(max, 100.0);
                assert_eq!(default, 3.0);
            }
            other => panic!("expected IntSlider, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_integer_parameter_gets_neutral_slider() {
        let endpoint = EndpointSpec::new("GET", "/recipes");
        let param = query_param("depthlimit");

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::IntSlider {
                min, max, default, ..
            } => {
                assert_eq!((min, max), (0.0, 100.0));
                assert_eq!(default, 50.0);
            }
            other => panic!("expected IntSlider, got {:?}", other),
        }
    }

    #[test]
    fn collection_formats_pick_select_controls() {
        let endpoint = EndpointSpec::new("GET", "/flavor/search");

        let mut single = query_param("profile");
        single.collection_format = Some("single".to_string());
        single.x_enum_values = vec!["Fruity".to_string()];
        match select_control(&single, &context(&endpoint, &[])) {
            ControlDescriptor::SearchSelect { suggestions } => {
                assert_eq!(suggestions, vec!["Fruity"]);
            }
            other => panic!("expected SearchSelect, got {:?}", other),
        }

        let mut multi = query_param("ingredients");
        multi.collection_format = Some("multi".to_string());
        assert_eq!(
            select_control(&multi, &context(&endpoint, &[])),
            ControlDescriptor::MultiText
        );

        multi.x_enum_values = vec!["salt".to_string(), "pepper".to_string()];
        match select_control(&multi, &context(&endpoint, &[])) {
            ControlDescriptor::MultiPick { suggestions } => {
                assert_eq!(suggestions.len(), 2);
            }
            other => panic!("expected MultiPick, got {:?}", other),
        }
    }

    #[test]
    fn fallback_text_input_carries_example_and_suggestions() {
        let endpoint = EndpointSpec::new("GET", "/flavor");
        let mut param = query_param("isSweet");
        param.param_type = "boolean".to_string();
        param.example = Some(json!("true"));

        match select_control(&param, &context(&endpoint, &[])) {
            ControlDescriptor::TextInput {
                placeholder,
                suggestions,
            } => {
                assert_eq!(placeholder, "true");
                assert_eq!(suggestions, vec!["true", "false"]);
            }
            other => panic!("expected TextInput, got {:?}", other),
        }
    }

    #[test]
    fn pair_control_without_field_param_uses_pair_statistics() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.x_statistics = vec![FieldStats {
            field: Some("carbs".to_string()),
            min: Some(0.0),
            max: Some(120.0),
            ..FieldStats::default()
        }];
        endpoint.parameters = vec![query_param("minCarbs"), query_param("maxCarbs")];
        let pairs = derive_pairs(&endpoint);

        let control = pair_control(&pairs[0], &endpoint, None).unwrap();
        assert_eq!(control.label, "carbs");
        assert_eq!(control.min_bound, 0.0);
        assert_eq!(control.max_bound, 120.0);
        assert_eq!(control.min_key, "minCarbs");
    }

    #[test]
    fn field_gate_blocks_pairs_until_a_field_is_chosen() {
        let mut endpoint = EndpointSpec::new("GET", "/nutrition");
        endpoint.x_statistics = vec![
            FieldStats {
                field: Some("protein".to_string()),
                min: Some(0.0),
                max: Some(80.0),
                ..FieldStats::default()
            },
            FieldStats {
                field: Some("fiber".to_string()),
                min: Some(0.0),
                max: Some(40.0),
                ..FieldStats::default()
            },
        ];
        endpoint.parameters = vec![
            query_param("field"),
            query_param("min"),
            query_param("max"),
        ];
        let pairs = derive_pairs(&endpoint);

        assert!(pair_control(&pairs[0], &endpoint, None).is_none());
        assert!(pair_control(&pairs[0], &endpoint, Some("")).is_none());

        let control = pair_control(&pairs[0], &endpoint, Some("fiber")).unwrap();
        assert_eq!(control.label, "fiber");
        assert_eq!(control.max_bound, 40.0);

        // Unknown selection keeps the pair's own statistics
        let control = pair_control(&pairs[0], &endpoint, Some("unknown")).unwrap();
        assert_eq!(control.label, "unknown");
        assert_eq!(control.max_bound, pairs[0].stats.max.unwrap_or(100.0));
    }

    #[test]
    fn energy_block_needs_both_bounds() {
        let mut endpoint = EndpointSpec::new("GET", "/nutrition");
        endpoint.parameters = vec![query_param("minEnergy")];
        assert!(energy_control(&endpoint).is_none());

        endpoint.parameters.push(query_param("maxEnergy"));
        let control = energy_control(&endpoint).unwrap();
        assert_eq!(control.label, "Energy (kcal)");
        // Resolver fallback supplies 0..100; the oversized ceiling is
        // reserved for entries without numeric bounds
        assert_eq!(control.min_bound, 0.0);
        assert_eq!(control.max_bound, 100.0);
    }

    #[test]
    fn energy_ceiling_applies_when_the_matched_entry_has_no_bounds() {
        let mut endpoint = EndpointSpec::new("GET", "/nutrition");
        endpoint.x_enum_values = vec![FieldStats {
            field: Some("energy".to_string()),
            ..FieldStats::default()
        }];
        endpoint.parameters = vec![query_param("minEnergy"), query_param("maxEnergy")];

        let control = energy_control(&endpoint).unwrap();
        assert_eq!(control.min_bound, 0.0);
        assert_eq!(control.max_bound, 3_440_456.64);
    }

    #[test]
    fn precision_follows_bound_decimals() {
        assert_eq!(decimal_precision(0.0, 100.0), 0);
        assert_eq!(decimal_precision(0.0, 612_854.6), 1);
        assert_eq!(decimal_precision(0.25, 99.1234), 4);
        assert_eq!(decimal_precision(0.123456, 1.0), 4);
    }

    #[test]
    fn formatting_rounds_or_fixes_by_precision() {
        assert_eq!(format_number(5.4, 0.0, 100.0), "5");
        assert_eq!(format_number(5.5, 0.0, 10.5), "5.5");
        assert_eq!(format_number(5.0, 0.0, 612_854.6), "5.0");
        assert_eq!(format_with_precision("7.24", 0.0, 10.5), "7.2");
        assert_eq!(format_with_precision("", 0.0, 10.5), "");
        assert_eq!(format_with_precision("abc", 0.0, 10.5), "");
    }
}
