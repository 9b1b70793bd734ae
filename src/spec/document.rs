//! Data models for the loaded API document, its endpoints and parameters

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    FALLBACK_AVG, FALLBACK_MAX, FALLBACK_MEAN, FALLBACK_MIN, FALLBACK_STD_DEV, UNTAGGED_GROUP,
};

/// Parameter location in a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    pub fn from_swagger(raw: &str) -> Self {
        match raw {
            "path" => ParameterLocation::Path,
            "header" => ParameterLocation::Header,
            "body" => ParameterLocation::Body,
            "formData" => ParameterLocation::FormData,
            _ => ParameterLocation::Query,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        }
    }

    /// Section heading shown above a parameter group in the form
    pub fn heading(&self) -> &str {
        match self {
            ParameterLocation::Path => "Path Parameters",
            ParameterLocation::Query => "Query Parameters",
            ParameterLocation::Header => "Header Parameters",
            ParameterLocation::Body => "Body Parameters",
            ParameterLocation::FormData => "Form Data",
        }
    }

    /// Wording used in the parameter detail panel
    pub fn detail_label(&self) -> &str {
        match self {
            ParameterLocation::Path => "URL Path",
            ParameterLocation::Query => "Query String",
            ParameterLocation::Header => "Header",
            ParameterLocation::Body => "Request Body",
            ParameterLocation::FormData => "Form Data",
        }
    }
}

/// Numeric statistics and/or curated values attached to a field name.
///
/// Entries come from `x-statistics` (numeric side) and `x-enum-values`
/// (named value lists) on endpoints and parameters. Either side may be
/// absent in any given entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub field: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub values: Vec<String>,
}

impl FieldStats {
    /// Neutral statistics used when nothing in the document matches
    pub fn fallback() -> Self {
        FieldStats {
            field: None,
            min: Some(FALLBACK_MIN),
            max: Some(FALLBACK_MAX),
            avg: Some(FALLBACK_AVG),
            mean: Some(FALLBACK_MEAN),
            std_dev: Some(FALLBACK_STD_DEV),
            values: Vec::new(),
        }
    }
}

/// A single declared parameter on an endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// Declared type ("string", "integer", "number", "boolean", "array")
    pub param_type: String,
    /// Declared format refinement ("int32", "date", ...)
    pub format: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    /// "single" or "multi" when the document constrains value picking
    pub collection_format: Option<String>,
    /// Values declared via a plain `enum`
    pub enum_values: Vec<String>,
    /// Curated suggestions carried on the parameter itself
    pub x_enum_values: Vec<String>,
    /// Statistics carried on the parameter itself
    pub x_statistics: Option<FieldStats>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        ParameterSpec {
            name: name.into(),
            location,
            required: false,
            param_type: "string".to_string(),
            format: None,
            description: None,
            default: None,
            example: None,
            collection_format: None,
            enum_values: Vec::new(),
            x_enum_values: Vec::new(),
            x_statistics: None,
        }
    }

    /// Suggestion list for free-text entry: curated values win over the
    /// declared enum, booleans fall back to their two literals
    pub fn suggestions(&self) -> Vec<String> {
        if !self.x_enum_values.is_empty() {
            return self.x_enum_values.clone();
        }
        if !self.enum_values.is_empty() {
            return self.enum_values.clone();
        }
        if self.param_type == "boolean" {
            return vec!["true".to_string(), "false".to_string()];
        }
        Vec::new()
    }

    pub fn is_multi_select(&self) -> bool {
        self.collection_format.as_deref() == Some("multi")
    }

    pub fn is_single_select(&self) -> bool {
        self.collection_format.as_deref() == Some("single")
    }

    /// Example shown in the detail panel: the declared example when the
    /// document carries one, otherwise generated from the parameter
    /// name, falling back to its type
    pub fn example_hint(&self) -> String {
        if let Some(example) = &self.example {
            let rendered = value_to_string(example);
            if !rendered.is_empty() {
                return rendered;
            }
        }

        let lowered = self.name.to_lowercase();
        let by_fragment: &[(&str, &str)] = &[
            ("id", "15683"),
            ("pubchem", "1183"),
            ("receptor", "OR1A1"),
            ("name", "Vanillin"),
            ("input", "vanil"),
            ("query", "vanil"),
            ("search", "vanil"),
            ("source", "Coffee"),
            ("category", "Aromatic"),
            ("limit", "10"),
            ("page", "1"),
        ];
        for (fragment, example) in by_fragment {
            if lowered.contains(fragment) {
                return example.to_string();
            }
        }

        match self.param_type.as_str() {
            "integer" | "number" => "100".to_string(),
            "boolean" => "true".to_string(),
            "array" => "[item1, item2]".to_string(),
            _ => "example_value".to_string(),
        }
    }
}

/// One property of a JSON request body schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyProperty {
    pub name: String,
    pub prop_type: String,
    pub example: Option<Value>,
    pub x_enum_values: Vec<String>,
    pub x_statistics: Option<FieldStats>,
}

/// Schema of the JSON request body, when the endpoint declares one
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BodySchema {
    pub required: bool,
    pub properties: Vec<BodyProperty>,
}

/// A single operation (method + path) from the loaded document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// HTTP method, uppercase
    pub method: String,
    /// URL path (e.g., "/recipe/{id}")
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Tags for sidebar grouping
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<ParameterSpec>,
    /// JSON body schema from the operation's request body, if any
    pub body_schema: Option<BodySchema>,
    /// Endpoint-level field statistics (single objects are normalized
    /// to one-entry lists at load time)
    pub x_statistics: Vec<FieldStats>,
    /// Endpoint-level curated field entries
    pub x_enum_values: Vec<FieldStats>,
    /// Security scheme names; `None` means the operation defers to the
    /// document-level requirement
    pub security: Option<Vec<String>>,
}

impl EndpointSpec {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        EndpointSpec {
            method: method.into().to_uppercase(),
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            parameters: Vec::new(),
            body_schema: None,
            x_statistics: Vec::new(),
            x_enum_values: Vec::new(),
            security: None,
        }
    }

    /// Returns display title for the endpoint
    pub fn display_title(&self) -> String {
        self.summary
            .clone()
            .or_else(|| self.operation_id.clone())
            .unwrap_or_else(|| self.path.clone())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Key the body editor and the dispatcher share for the request
    /// body: the body parameter's name, or a fixed key for endpoints
    /// that only declare a schema
    pub fn body_key(&self) -> Option<&str> {
        let named = self
            .parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body)
            .map(|p| p.name.as_str());
        if named.is_some() {
            return named;
        }
        if self.body_schema.is_some() {
            return Some("body");
        }
        None
    }

    /// Whether calling this endpoint needs a Bearer key. An operation
    /// that declares its own security list overrides the global one.
    pub fn requires_auth(&self, global_security: &[String]) -> bool {
        match &self.security {
            Some(schemes) => !schemes.is_empty(),
            None => !global_security.is_empty(),
        }
    }

    /// Candidate values for the `field` selector, drawn from the names
    /// carried by the endpoint-level extension entries
    pub fn field_options(&self) -> Vec<String> {
        let from_enums: Vec<String> = self
            .x_enum_values
            .iter()
            .filter_map(|entry| entry.field.clone())
            .collect();
        if !from_enums.is_empty() {
            return from_enums;
        }
        self.x_statistics
            .iter()
            .filter_map(|entry| entry.field.clone())
            .collect()
    }

    fn matches_query(&self, lowered: &str) -> bool {
        if self.path.to_lowercase().contains(lowered) {
            return true;
        }
        if self.method.to_lowercase().contains(lowered) {
            return true;
        }
        if let Some(summary) = &self.summary {
            if summary.to_lowercase().contains(lowered) {
                return true;
            }
        }
        if let Some(description) = &self.description {
            if description.to_lowercase().contains(lowered) {
                return true;
            }
        }
        self.tags.iter().any(|t| t.to_lowercase().contains(lowered))
    }
}

/// The loaded API document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSpec {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Host from the document, without scheme
    pub host: Option<String>,
    pub base_path: String,
    pub schemes: Vec<String>,
    /// Document-level security scheme names
    pub security: Vec<String>,
    pub endpoints: Vec<EndpointSpec>,
}

impl ApiSpec {
    pub fn new() -> Self {
        ApiSpec::default()
    }

    /// Endpoints grouped by their first tag, untagged ones under a
    /// shared bucket. Groups keep the order tags first appear in the
    /// document.
    pub fn grouped_endpoints(&self) -> Vec<(String, Vec<&EndpointSpec>)> {
        let mut groups: Vec<(String, Vec<&EndpointSpec>)> = Vec::new();

        for endpoint in &self.endpoints {
            let group = endpoint
                .tags
                .first()
                .map(String::as_str)
                .unwrap_or(UNTAGGED_GROUP);
            match groups.iter_mut().find(|(tag, _)| tag == group) {
                Some((_, members)) => members.push(endpoint),
                None => groups.push((group.to_string(), vec![endpoint])),
            }
        }

        groups
    }

    /// Grouped endpoints narrowed by a case-insensitive search. A group
    /// whose tag matches keeps all its endpoints, otherwise endpoints
    /// match on path, method, summary, description or tag.
    pub fn filtered_groups(&self, query: &str) -> Vec<(String, Vec<&EndpointSpec>)> {
        let lowered = query.trim().to_lowercase();
        let groups = self.grouped_endpoints();
        if lowered.is_empty() {
            return groups;
        }

        groups
            .into_iter()
            .filter_map(|(tag, endpoints)| {
                if tag.to_lowercase().contains(&lowered) {
                    return Some((tag, endpoints));
                }
                let matched: Vec<&EndpointSpec> = endpoints
                    .into_iter()
                    .filter(|e| e.matches_query(&lowered))
                    .collect();
                if matched.is_empty() {
                    None
                } else {
                    Some((tag, matched))
                }
            })
            .collect()
    }
}

/// Renders a document value the way a text field expects it
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
