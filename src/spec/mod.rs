//! Specification loading and normalization - turns a Swagger/OpenAPI
//! document into the typed model the playground works on

pub mod document;
pub mod loader;
pub mod stats;

pub use document::{ApiSpec, EndpointSpec, FieldStats, ParameterLocation, ParameterSpec};
pub use loader::{parse_api_spec, spec_from_value};
pub use stats::{normalize_field_name, resolve_statistics};
