//! # Palate TUI
//!
//! A terminal playground for the flavor data API, driven entirely by its
//! Swagger document.
//!
//! ## Features
//! - Endpoint sidebar grouped by tag, with live search
//! - Form controls picked per parameter by an ordered rule cascade
//! - Min/max parameters combined into two-bound range sliders
//! - Statistics-backed bounds and defaults
//! - Live calls with a Bearer key, metered by the account token balance
//! - JSON syntax highlighting
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod constants;
pub mod profile;
pub mod storage;
pub mod ui;
pub mod spec;
pub mod form;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use spec::{ApiSpec, EndpointSpec, ParameterSpec, parse_api_spec};
pub use form::{FormItem, FormSession, select_control, validate_form};
pub use profile::UserProfile;
pub use storage::Storage;
pub use messages::{UiEvent, NetworkCommand, NetworkResponse, RenderState};
pub use app::{AppState, AppActor};
pub use network::NetworkActor;
