//! Per-endpoint form state
//!
//! One session exists per selected endpoint and owns the entered
//! values, the validation errors and the derived range pairs. The
//! drawable item list is rebuilt on demand because control choice
//! depends on the current field selection.

use std::collections::HashMap;

use crate::constants::{CALORIES_MAX_KEY, CALORIES_MIN_KEY};
use crate::form::controls::{
    body_template, energy_control, pair_control, select_control, ControlContext,
    ControlDescriptor, PairControl,
};
use crate::form::pairing::{derive_pairs, RangePair};
use crate::form::validate::{synthesize_values, validate_form, ParamValue};
use crate::spec::document::{EndpointSpec, ParameterLocation, ParameterSpec};

const LOCATION_ORDER: &[ParameterLocation] = &[
    ParameterLocation::Path,
    ParameterLocation::Query,
    ParameterLocation::Header,
    ParameterLocation::FormData,
    ParameterLocation::Body,
];

/// One drawable row of the form pane
#[derive(Clone, Debug, PartialEq)]
pub enum FormItem {
    /// Non-interactive section heading
    Heading(String),
    /// A single parameter with its chosen control
    Control {
        name: String,
        required: bool,
        description: Option<String>,
        descriptor: ControlDescriptor,
    },
    /// Combined two-bound range block, energy or a derived pair
    Pair(PairControl),
}

impl FormItem {
    /// Whether focus can land on this row
    pub fn focusable(&self) -> bool {
        !matches!(self, FormItem::Heading(_))
    }

    /// Keys under which this row reads values and errors. The calories
    /// control edits its scratch keys, not the parameter it stands for.
    pub fn value_keys(&self) -> Vec<&str> {
        match self {
            FormItem::Heading(_) => Vec::new(),
            FormItem::Control {
                descriptor: ControlDescriptor::CaloriesRange { .. },
                ..
            } => vec![CALORIES_MIN_KEY, CALORIES_MAX_KEY],
            FormItem::Control { name, .. } => vec![name.as_str()],
            FormItem::Pair(pair) => vec![pair.min_key.as_str(), pair.max_key.as_str()],
        }
    }
}

/// Entered values and validation state for the selected endpoint
#[derive(Clone, Debug)]
pub struct FormSession {
    pub endpoint: EndpointSpec,
    pairs: Vec<RangePair>,
    values: HashMap<String, String>,
    errors: HashMap<String, String>,
}

impl FormSession {
    pub fn new(endpoint: EndpointSpec) -> Self {
        let pairs = derive_pairs(&endpoint);
        let mut values = HashMap::new();
        // the body editor starts out holding the schema template
        if let Some(key) = endpoint.body_key() {
            let (template, _) = body_template(&endpoint);
            values.insert(key.to_string(), template);
        }
        FormSession {
            endpoint,
            pairs,
            values,
            errors: HashMap::new(),
        }
    }

    pub fn pairs(&self) -> &[RangePair] {
        &self.pairs
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Field currently chosen in the endpoint's `field` parameter
    pub fn selected_field(&self) -> Option<&str> {
        match self.values.get("field") {
            Some(value) if !value.is_empty() => Some(value.as_str()),
            _ => None,
        }
    }

    /// Key the body editor stores its value under, when the endpoint
    /// takes a body at all
    pub fn body_key(&self) -> Option<&str> {
        self.endpoint.body_key()
    }

    /// Stores a value. A non-empty value clears any standing error for
    /// the key; an empty one keeps the error visible.
    pub fn set_value(&mut self, name: &str, value: String) {
        if !value.is_empty() {
            self.errors.remove(name);
        }
        self.values.insert(name.to_string(), value);
    }

    /// Toggles one option of a multi-valued parameter in its joined
    /// string form
    pub fn toggle_multi(&mut self, name: &str, option: &str) {
        let mut selected: Vec<String> = self
            .value(name)
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect();
        match selected.iter().position(|entry| entry == option) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(option.to_string()),
        }
        self.set_value(name, selected.join(", "));
    }

    /// Runs validation over the entered values, replacing the error
    /// map. Returns whether the form may be dispatched.
    pub fn validate(&mut self) -> bool {
        self.errors = validate_form(&self.endpoint, &self.pairs, &self.values);
        self.errors.is_empty()
    }

    /// Values as dispatch will send them
    pub fn payload(&self) -> HashMap<String, ParamValue> {
        synthesize_values(&self.endpoint, &self.values)
    }

    /// Index of the first item carrying a validation error, in draw
    /// order
    pub fn first_error_index(&self) -> Option<usize> {
        self.form_items().iter().position(|item| {
            item.value_keys()
                .iter()
                .any(|key| self.errors.contains_key(*key))
        })
    }

    /// Assembles the drawable form. Per location group: required-first
    /// main list, then the field selector, the range blocks, and the
    /// paging controls. Members of complete pairs appear only inside
    /// their combined block.
    pub fn form_items(&self) -> Vec<FormItem> {
        let mut items = Vec::new();
        let selected_field = self.selected_field();

        for location in LOCATION_ORDER {
            let group: Vec<&ParameterSpec> = self
                .endpoint
                .parameters
                .iter()
                .filter(|param| param.location == *location)
                .collect();
            let schema_only_body = *location == ParameterLocation::Body
                && group.is_empty()
                && self.endpoint.body_schema.is_some();
            if group.is_empty() && !schema_only_body {
                continue;
            }

            items.push(FormItem::Heading(location.heading().to_string()));

            if schema_only_body {
                let (template, helper) = body_template(&self.endpoint);
                items.push(FormItem::Control {
                    name: self.body_key().unwrap_or("body").to_string(),
                    required: self
                        .endpoint
                        .body_schema
                        .as_ref()
                        .map(|schema| schema.required)
                        .unwrap_or(false),
                    description: None,
                    descriptor: ControlDescriptor::BodyEditor { template, helper },
                });
                continue;
            }

            let mut main: Vec<&ParameterSpec> = group
                .iter()
                .copied()
                .filter(|param| {
                    !self.is_complete_pair_member(&param.name)
                        && param.name != "field"
                        && param.name != "page"
                        && param.name != "limit"
                        && param.name != "page_size"
                })
                .collect();
            main.sort_by_key(|param| !param.required);
            for param in main {
                items.push(self.control_item(param));
            }

            if let Some(field) = group.iter().find(|param| param.name == "field") {
                items.push(self.control_item(field));
            }

            if let Some(energy) = energy_control(&self.endpoint) {
                let placement = self
                    .endpoint
                    .parameter("minEnergy")
                    .map(|param| param.location);
                if placement == Some(*location) {
                    items.push(FormItem::Pair(energy));
                }
            }

            for pair in &self.pairs {
                if pair.is_energy() || self.pair_location(pair) != Some(*location) {
                    continue;
                }
                if let Some(control) = pair_control(pair, &self.endpoint, selected_field) {
                    items.push(FormItem::Pair(control));
                }
            }

            for name in ["page", "limit", "page_size"] {
                if let Some(param) = group.iter().find(|param| param.name == name) {
                    items.push(self.control_item(param));
                }
            }
        }

        items
    }

    fn control_item(&self, param: &ParameterSpec) -> FormItem {
        let ctx = ControlContext {
            endpoint: &self.endpoint,
            pairs: &self.pairs,
        };
        FormItem::Control {
            name: param.name.clone(),
            required: param.required,
            description: param.description.clone(),
            descriptor: select_control(param, &ctx),
        }
    }

    fn is_complete_pair_member(&self, name: &str) -> bool {
        self.pairs.iter().any(|pair| {
            pair.is_complete()
                && (pair.min_name.as_deref() == Some(name)
                    || pair.max_name.as_deref() == Some(name))
        })
    }

    fn pair_location(&self, pair: &RangePair) -> Option<ParameterLocation> {
        let member = pair.min_name.as_deref().or(pair.max_name.as_deref())?;
        self.endpoint.parameter(member).map(|param| param.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::document::{BodyProperty, BodySchema};
    use serde_json::json;

    fn query_param(name: &str) -> ParameterSpec {
        ParameterSpec::new(name, ParameterLocation::Query)
    }

    fn playground_endpoint() -> EndpointSpec {
        let mut endpoint = EndpointSpec::new("GET", "/recipes/{id}/filter");
        let mut id = ParameterSpec::new("id", ParameterLocation::Path);
        id.required = true;
        let mut title = query_param("title");
        title.required = true;
        endpoint.parameters = vec![
            id,
            query_param("sort"),
            title,
            query_param("field"),
            query_param("page"),
            query_param("limit"),
            query_param("minCarbs"),
            query_param("maxCarbs"),
            query_param("minEnergy"),
            query_param("maxEnergy"),
        ];
        endpoint.x_enum_values = vec![crate::spec::document::FieldStats {
            field: Some("carbs".to_string()),
            min: Some(1.0),
            max: Some(90.0),
            ..Default::default()
        }];
        endpoint
    }

    fn item_names(items: &[FormItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                FormItem::Heading(text) => format!("#{}", text),
                FormItem::Control { name, .. } => name.clone(),
                FormItem::Pair(pair) => format!("[{}]", pair.label),
            })
            .collect()
    }

    #[test]
    fn items_follow_the_documented_order() {
        let session = FormSession::new(playground_endpoint());
        let names = item_names(&session.form_items());
        // carbs pair is absent until a field is chosen; energy is not
        // gated
        assert_eq!(
            names,
            vec![
                "#Path Parameters",
                "id",
                "#Query Parameters",
                "title",
                "sort",
                "field",
                "[Energy (kcal)]",
                "page",
                "limit",
            ]
        );
    }

    #[test]
    fn choosing_a_field_reveals_the_gated_pair() {
        let mut session = FormSession::new(playground_endpoint());
        session.set_value("field", "carbs".to_string());
        let names = item_names(&session.form_items());
        assert!(names.contains(&"[carbs]".to_string()));
    }

    #[test]
    fn ungated_endpoints_show_pairs_immediately() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![query_param("minProtein"), query_param("maxProtein")];
        let session = FormSession::new(endpoint);
        let names = item_names(&session.form_items());
        assert_eq!(names, vec!["#Query Parameters", "[Protein]"]);
    }

    #[test]
    fn body_editor_value_is_prefilled_with_the_template() {
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        let mut body = ParameterSpec::new("payload", ParameterLocation::Body);
        body.required = true;
        endpoint.parameters = vec![body];
        endpoint.body_schema = Some(BodySchema {
            required: true,
            properties: vec![BodyProperty {
                name: "days".to_string(),
                prop_type: "integer".to_string(),
                example: Some(json!(7)),
                x_enum_values: Vec::new(),
                x_statistics: None,
            }],
        });

        let session = FormSession::new(endpoint);
        assert_eq!(session.body_key(), Some("payload"));
        assert!(session.value("payload").contains("\"days\": 7"));
    }

    #[test]
    fn schema_without_body_parameter_gets_a_synthetic_editor() {
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        endpoint.body_schema = Some(BodySchema {
            required: false,
            properties: Vec::new(),
        });

        let session = FormSession::new(endpoint);
        assert_eq!(session.body_key(), Some("body"));
        let items = session.form_items();
        assert_eq!(items.len(), 2);
        match &items[1] {
            FormItem::Control {
                name,
                descriptor: ControlDescriptor::BodyEditor { template, .. },
                ..
            } => {
                assert_eq!(name, "body");
                assert_eq!(template, "{}");
            }
            other => panic!("expected a body editor, got {:?}", other),
        }
    }

    #[test]
    fn non_empty_values_clear_standing_errors() {
        let mut session = FormSession::new(playground_endpoint());
        assert!(!session.validate());
        assert!(session.error("title").is_some());

        session.set_value("title", "smoothie".to_string());
        assert!(session.error("title").is_none());

        session.set_value("id", String::new());
        assert!(session.error("id").is_some());
    }

    #[test]
    fn toggle_multi_joins_and_removes_options() {
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        let mut cuisines = query_param("cuisines");
        cuisines.collection_format = Some("multi".to_string());
        endpoint.parameters = vec![cuisines];
        let mut session = FormSession::new(endpoint);

        session.toggle_multi("cuisines", "Thai");
        session.toggle_multi("cuisines", "Greek");
        assert_eq!(session.value("cuisines"), "Thai, Greek");

        session.toggle_multi("cuisines", "Thai");
        assert_eq!(session.value("cuisines"), "Greek");
    }

    #[test]
    fn first_error_lands_on_the_earliest_item() {
        let mut session = FormSession::new(playground_endpoint());
        session.set_value("title", "smoothie".to_string());
        assert!(!session.validate());

        // id is the first focusable item
        let index = session.first_error_index().unwrap();
        let items = session.form_items();
        match &items[index] {
            FormItem::Control { name, .. } => assert_eq!(name, "id"),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn calories_errors_map_to_the_calories_item() {
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        endpoint.parameters = vec![query_param("calories_per_day")];
        let mut session = FormSession::new(endpoint);
        session.set_value(CALORIES_MIN_KEY, "300".to_string());
        session.set_value(CALORIES_MAX_KEY, "100".to_string());
        assert!(!session.validate());

        let index = session.first_error_index().unwrap();
        let items = session.form_items();
        assert!(matches!(
            &items[index],
            FormItem::Control {
                descriptor: ControlDescriptor::CaloriesRange { .. },
                ..
            }
        ));
    }
}
