//! Swagger/OpenAPI document parser
//!
//! Accepts JSON or YAML (picked by file extension) and walks the raw
//! value tree into [`ApiSpec`]. Swagger 2 fields are the primary shape
//! (`host`, `basePath`, `type` on parameters); the OpenAPI 3 style
//! `requestBody` is also read because real documents mix the two.

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::spec::document::{
    value_to_string, ApiSpec, BodyProperty, BodySchema, EndpointSpec, FieldStats,
    ParameterLocation, ParameterSpec,
};

/// Parse a specification file and return the typed document
pub fn parse_api_spec(spec_path: &Path) -> Result<ApiSpec> {
    let content = fs::read_to_string(spec_path)?;

    // Determine if JSON or YAML
    let value: Value = if spec_path.extension().map(|e| e == "json").unwrap_or(false) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    Ok(spec_from_value(&value))
}

/// Build the typed document from an already parsed value tree
pub fn spec_from_value(spec: &Value) -> ApiSpec {
    let mut api = ApiSpec::new();

    if let Some(info) = spec.get("info") {
        api.title = info.get("title").and_then(|v| v.as_str()).map(String::from);
        api.version = info
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from);
        api.description = info
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);
    }

    api.host = spec.get("host").and_then(|v| v.as_str()).map(String::from);
    api.base_path = spec
        .get("basePath")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    if let Some(schemes) = spec.get("schemes").and_then(|s| s.as_array()) {
        api.schemes = schemes
            .iter()
            .filter_map(|s| s.as_str().map(String::from))
            .collect();
    }

    if let Some(security) = spec.get("security") {
        api.security = security_names(security);
    }

    if let Some(paths) = spec.get("paths").and_then(|p| p.as_object()) {
        for (path, methods) in paths {
            if let Some(methods_obj) = methods.as_object() {
                for (method, operation) in methods_obj {
                    // Skip non-HTTP method keys like "parameters"
                    if !is_http_method(method) {
                        continue;
                    }

                    let mut endpoint = parse_endpoint(method, path, operation);

                    // Merge path-level parameters without duplicating
                    if let Some(params) = methods.get("parameters").and_then(|p| p.as_array()) {
                        for param in params {
                            if let Some(p) = parse_parameter(param) {
                                if !endpoint.parameters.iter().any(|ep| ep.name == p.name) {
                                    endpoint.parameters.push(p);
                                }
                            }
                        }
                    }

                    api.endpoints.push(endpoint);
                }
            }
        }
    }

    api
}

fn is_http_method(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "get" | "post" | "put" | "patch" | "delete" | "head" | "options"
    )
}

fn parse_endpoint(method: &str, path: &str, operation: &Value) -> EndpointSpec {
    let mut endpoint = EndpointSpec::new(method, path);

    let op = match operation.as_object() {
        Some(op) => op,
        None => return endpoint,
    };

    endpoint.operation_id = op
        .get("operationId")
        .and_then(|v| v.as_str())
        .map(String::from);

    endpoint.summary = op.get("summary").and_then(|v| v.as_str()).map(String::from);

    endpoint.description = op
        .get("description")
        .and_then(|v| v.as_str())
        .map(String::from);

    endpoint.deprecated = op
        .get("deprecated")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if let Some(tags) = op.get("tags").and_then(|t| t.as_array()) {
        endpoint.tags = tags
            .iter()
            .filter_map(|t| t.as_str().map(String::from))
            .collect();
    }

    if let Some(params) = op.get("parameters").and_then(|p| p.as_array()) {
        for param in params {
            if let Some(p) = parse_parameter(param) {
                endpoint.parameters.push(p);
            }
        }
    }

    endpoint.body_schema = parse_body_schema(operation);

    endpoint.x_statistics = stats_list(op.get("x-statistics"));
    endpoint.x_enum_values = stats_list(op.get("x-enum-values"));

    // Operation-level security overrides the document-level requirement
    endpoint.security = op.get("security").map(security_names);

    endpoint
}

fn parse_parameter(param: &Value) -> Option<ParameterSpec> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = ParameterLocation::from_swagger(
        param.get("in").and_then(|v| v.as_str()).unwrap_or("query"),
    );

    let mut spec = ParameterSpec::new(name, location);

    spec.required = param
        .get("required")
        .and_then(|r| r.as_bool())
        .unwrap_or(false);

    spec.param_type = param
        .get("type")
        .and_then(|t| t.as_str())
        .or_else(|| {
            param
                .get("schema")
                .and_then(|s| s.get("type"))
                .and_then(|t| t.as_str())
        })
        .unwrap_or("string")
        .to_string();

    spec.format = param
        .get("format")
        .or_else(|| param.get("schema").and_then(|s| s.get("format")))
        .and_then(|f| f.as_str())
        .map(String::from);

    spec.description = param
        .get("description")
        .and_then(|d| d.as_str())
        .map(String::from);

    spec.default = param.get("default").cloned().or_else(|| {
        param
            .get("schema")
            .and_then(|s| s.get("default"))
            .cloned()
    });

    spec.example = param
        .get("x-example")
        .cloned()
        .or_else(|| param.get("example").cloned());

    spec.collection_format = param
        .get("collectionFormat")
        .and_then(|c| c.as_str())
        .map(String::from);

    spec.enum_values = string_list(param.get("enum")).unwrap_or_else(|| {
        string_list(param.get("schema").and_then(|s| s.get("enum"))).unwrap_or_default()
    });

    spec.x_enum_values = string_list(param.get("x-enum-values")).unwrap_or_default();
    spec.x_statistics = param.get("x-statistics").map(parse_field_stats);

    Some(spec)
}

fn parse_body_schema(operation: &Value) -> Option<BodySchema> {
    let request_body = operation.get("requestBody")?;
    let schema = request_body
        .get("content")?
        .get("application/json")?
        .get("schema")?;

    let required = request_body
        .get("required")
        .and_then(|r| r.as_bool())
        .unwrap_or(false);

    let mut properties = Vec::new();
    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (name, prop) in props {
            properties.push(BodyProperty {
                name: name.clone(),
                // Missing type stays empty so the template skips it
                prop_type: prop
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("")
                    .to_string(),
                example: prop.get("example").cloned(),
                x_enum_values: string_list(prop.get("x-enum-values")).unwrap_or_default(),
                x_statistics: prop.get("x-statistics").map(parse_field_stats),
            });
        }
    }

    Some(BodySchema {
        required,
        properties,
    })
}

/// Field entries appear as a list, a single object, or occasionally a
/// bare string naming a field. All shapes normalize to a list.
fn stats_list(value: Option<&Value>) -> Vec<FieldStats> {
    match value {
        Some(Value::Array(entries)) => entries.iter().map(parse_field_stats).collect(),
        Some(single @ Value::Object(_)) => vec![parse_field_stats(single)],
        _ => Vec::new(),
    }
}

fn parse_field_stats(value: &Value) -> FieldStats {
    if let Some(name) = value.as_str() {
        return FieldStats {
            field: Some(name.to_string()),
            ..FieldStats::default()
        };
    }

    FieldStats {
        field: value
            .get("field")
            .and_then(|f| f.as_str())
            .map(String::from),
        min: value.get("min").and_then(|v| v.as_f64()),
        max: value.get("max").and_then(|v| v.as_f64()),
        avg: value.get("avg").and_then(|v| v.as_f64()),
        mean: value.get("mean").and_then(|v| v.as_f64()),
        std_dev: value.get("stdDev").and_then(|v| v.as_f64()),
        values: string_list(value.get("values")).unwrap_or_default(),
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let entries = value?.as_array()?;
    Some(entries.iter().map(value_to_string).collect())
}

fn security_names(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(arr) = value.as_array() {
        for requirement in arr {
            if let Some(obj) = requirement.as_object() {
                names.extend(obj.keys().cloned());
            }
        }
    }
    names
}
