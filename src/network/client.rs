//! HTTP client wrapper - builds playground requests and executes them

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Value};

use crate::constants::{DEFAULT_API_HOST, DEFAULT_SCHEME, PROFILE_PATH};
use crate::form::validate::ParamValue;
use crate::messages::network::{CallOutcome, NetworkResponse, PreparedRequest};
use crate::profile::UserProfile;
use crate::spec::document::{ApiSpec, EndpointSpec, ParameterLocation};
use crate::spec::loader::{parse_api_spec, spec_from_value};

/// Characters escaped when a value is substituted into a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Builds the outgoing request for an endpoint from the synthesized
/// values. Path parameters substitute into the URL percent-encoded,
/// query-located values append as query pairs, and the body editor's
/// JSON rides along for body endpoints. Blank values are dropped.
pub fn build_request(
    spec: &ApiSpec,
    endpoint: &EndpointSpec,
    values: &HashMap<String, ParamValue>,
    api_key: Option<&str>,
) -> PreparedRequest {
    let scheme = spec
        .schemes
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_SCHEME);
    let host = spec
        .host
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_API_HOST);

    let mut path = endpoint.path.clone();
    for param in &endpoint.parameters {
        if param.location != ParameterLocation::Path {
            continue;
        }
        if let Some(value) = values.get(&param.name) {
            let rendered = value.query_value();
            if !rendered.is_empty() {
                let encoded = utf8_percent_encode(&rendered, PATH_SEGMENT).to_string();
                path = path.replace(&format!("{{{}}}", param.name), &encoded);
            }
        }
    }

    let mut query = Vec::new();
    for param in &endpoint.parameters {
        if param.location != ParameterLocation::Query {
            continue;
        }
        if let Some(value) = values.get(&param.name) {
            let rendered = value.query_value();
            if !rendered.is_empty() {
                query.push((param.name.clone(), rendered));
            }
        }
    }

    let body = endpoint.body_key().and_then(|key| match values.get(key) {
        Some(ParamValue::Text(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    });

    PreparedRequest {
        method: endpoint.method.clone(),
        url: format!("{}://{}{}{}", scheme, host, spec.base_path, path),
        query,
        bearer_key: api_key
            .map(String::from)
            .filter(|key| !key.is_empty()),
        body,
    }
}

/// Sends a prepared request. An HTTP response of any status is an
/// outcome; only transport failures surface as errors.
pub async fn execute_call(
    client: &reqwest::Client,
    request: PreparedRequest,
    request_id: u64,
) -> NetworkResponse {
    let start = Instant::now();

    let method = reqwest::Method::from_bytes(request.method.as_bytes())
        .unwrap_or(reqwest::Method::GET);
    let mut builder = client
        .request(method, &request.url)
        .header("Content-Type", "application/json");
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(key) = &request.bearer_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let result = builder.send().await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let status_text = resp
                .status()
                .canonical_reason()
                .unwrap_or("")
                .to_string();
            let data = match resp.text().await {
                Ok(body) => parse_response_body(&body),
                Err(e) => json!({ "error": format!("Error reading body: {}", e) }),
            };
            NetworkResponse::CallCompleted {
                id: request_id,
                outcome: CallOutcome {
                    status,
                    status_text,
                    data,
                },
                time_ms: elapsed,
            }
        }
        Err(e) => NetworkResponse::CallFailed {
            id: request_id,
            message: describe_error(&e),
            time_ms: elapsed,
        },
    }
}

/// Fetches the account profile with the Bearer key and stamps the
/// snapshot time
pub async fn fetch_profile(
    client: &reqwest::Client,
    key: String,
    request_id: u64,
) -> NetworkResponse {
    let url = format!("{}://{}{}", DEFAULT_SCHEME, DEFAULT_API_HOST, PROFILE_PATH);
    let result = client
        .get(&url)
        .header("Authorization", format!("Bearer {}", key))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => match resp.json::<UserProfile>().await {
            Ok(mut profile) => {
                profile.fetched_at = Some(Utc::now());
                NetworkResponse::ProfileFetched {
                    id: request_id,
                    profile,
                }
            }
            Err(e) => NetworkResponse::ProfileFailed {
                id: request_id,
                message: format!("Malformed profile: {}", e),
            },
        },
        Ok(resp) => NetworkResponse::ProfileFailed {
            id: request_id,
            message: format!("Profile request returned {}", resp.status()),
        },
        Err(e) => NetworkResponse::ProfileFailed {
            id: request_id,
            message: describe_error(&e),
        },
    }
}

/// Loads an api document from a local path or over HTTP and parses it
pub async fn load_spec(
    client: &reqwest::Client,
    source: String,
    request_id: u64,
) -> NetworkResponse {
    if source.starts_with("http://") || source.starts_with("https://") {
        let result = client.get(&source).send().await;
        return match result {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(raw) => NetworkResponse::SpecLoaded {
                    id: request_id,
                    spec: Box::new(spec_from_value(&raw)),
                },
                Err(e) => NetworkResponse::SpecFailed {
                    id: request_id,
                    message: format!("Failed to parse document from {}: {}", source, e),
                },
            },
            Ok(resp) => NetworkResponse::SpecFailed {
                id: request_id,
                message: format!("Document fetch returned {}", resp.status()),
            },
            Err(e) => NetworkResponse::SpecFailed {
                id: request_id,
                message: describe_error(&e),
            },
        };
    }

    match parse_api_spec(std::path::Path::new(&source)) {
        Ok(spec) => NetworkResponse::SpecLoaded {
            id: request_id,
            spec: Box::new(spec),
        },
        Err(e) => NetworkResponse::SpecFailed {
            id: request_id,
            message: format!("Failed to load {}: {:#}", source, e),
        },
    }
}

fn parse_response_body(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => Value::String(body.to_string()),
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out (30s)".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::document::ParameterSpec;

    fn spec_with_host() -> ApiSpec {
        let mut spec = ApiSpec::new();
        spec.host = Some("api.foodoscope.com".to_string());
        spec.base_path = "/recipe2".to_string();
        spec.schemes = vec!["https".to_string()];
        spec
    }

    #[test]
    fn url_substitutes_and_encodes_path_values() {
        let spec = spec_with_host();
        let mut endpoint = EndpointSpec::new("GET", "/recipes/{title}");
        let mut title = ParameterSpec::new("title", ParameterLocation::Path);
        title.required = true;
        endpoint.parameters = vec![title];

        let mut values = HashMap::new();
        values.insert(
            "title".to_string(),
            ParamValue::Text("pad thai/extra".to_string()),
        );

        let request = build_request(&spec, &endpoint, &values, None);
        assert_eq!(
            request.url,
            "https://api.foodoscope.com/recipe2/recipes/pad%20thai%2Fextra"
        );
    }

    #[test]
    fn defaults_apply_when_the_document_omits_host_and_scheme() {
        let spec = ApiSpec::new();
        let endpoint = EndpointSpec::new("GET", "/health");
        let request = build_request(&spec, &endpoint, &HashMap::new(), None);
        assert_eq!(request.url, "http://api.foodoscope.com/health");
    }

    #[test]
    fn only_declared_non_blank_query_values_are_kept() {
        let spec = spec_with_host();
        let mut endpoint = EndpointSpec::new("GET", "/recipes");
        endpoint.parameters = vec![
            ParameterSpec::new("title", ParameterLocation::Query),
            ParameterSpec::new("sort", ParameterLocation::Query),
        ];

        let mut values = HashMap::new();
        values.insert("title".to_string(), ParamValue::Text("taco".to_string()));
        values.insert("sort".to_string(), ParamValue::Text(String::new()));
        values.insert(
            "undeclared".to_string(),
            ParamValue::Text("nope".to_string()),
        );

        let request = build_request(&spec, &endpoint, &values, None);
        assert_eq!(
            request.query,
            vec![("title".to_string(), "taco".to_string())]
        );
    }

    #[test]
    fn range_values_serialize_into_one_query_pair() {
        let spec = spec_with_host();
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        endpoint.parameters = vec![ParameterSpec::new(
            "calories_per_day",
            ParameterLocation::Query,
        )];

        let mut values = HashMap::new();
        values.insert(
            "calories_per_day".to_string(),
            ParamValue::Range {
                min: 0.0,
                max: 2000.0,
            },
        );

        let request = build_request(&spec, &endpoint, &values, None);
        assert_eq!(request.query.len(), 1);
        assert_eq!(request.query[0].0, "calories_per_day");
        assert_eq!(request.query[0].1, r#"{"min":0.0,"max":2000.0}"#);
    }

    #[test]
    fn bearer_key_rides_along_only_when_present() {
        let spec = spec_with_host();
        let endpoint = EndpointSpec::new("GET", "/recipes");

        let without = build_request(&spec, &endpoint, &HashMap::new(), None);
        assert!(without.bearer_key.is_none());

        let blank = build_request(&spec, &endpoint, &HashMap::new(), Some(""));
        assert!(blank.bearer_key.is_none());

        let with = build_request(&spec, &endpoint, &HashMap::new(), Some("secret"));
        assert_eq!(with.bearer_key.as_deref(), Some("secret"));
    }

    #[test]
    fn body_endpoints_carry_the_editor_json() {
        let spec = spec_with_host();
        let mut endpoint = EndpointSpec::new("POST", "/mealplan");
        endpoint.parameters = vec![ParameterSpec::new("payload", ParameterLocation::Body)];

        let mut values = HashMap::new();
        values.insert(
            "payload".to_string(),
            ParamValue::Text("{\"days\": 3}".to_string()),
        );

        let request = build_request(&spec, &endpoint, &values, None);
        assert_eq!(request.body.as_deref(), Some("{\"days\": 3}"));

        let empty = build_request(&spec, &endpoint, &HashMap::new(), None);
        assert!(empty.body.is_none());
    }

    #[test]
    fn unparsable_response_bodies_fall_back_to_raw_text() {
        assert_eq!(
            parse_response_body("{\"ok\":true}"),
            json!({ "ok": true })
        );
        assert_eq!(
            parse_response_body("<html>oops</html>"),
            Value::String("<html>oops</html>".to_string())
        );
    }
}
