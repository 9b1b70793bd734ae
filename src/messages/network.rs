//! Network messages - communication between App and Network layers

use serde_json::Value;

use crate::profile::UserProfile;
use crate::spec::document::ApiSpec;

/// A fully built endpoint invocation, ready to send
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: String,
    /// Scheme, host, base path and substituted endpoint path
    pub url: String,
    /// Query pairs in append order
    pub query: Vec<(String, String)>,
    pub bearer_key: Option<String>,
    /// Raw JSON for endpoints that take a request body
    pub body: Option<String>,
}

/// What came back from an endpoint call that reached the server
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body, or a wrapper object when parsing failed
    pub data: Value,
}

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Invoke an endpoint
    CallEndpoint { id: u64, request: PreparedRequest },
    /// Fetch the account profile
    FetchProfile { id: u64, key: String },
    /// Fetch the account profile after a delay (post-call refresh)
    RefreshProfileAfter { id: u64, key: String, delay_ms: u64 },
    /// Load and parse an api document from a file path or URL
    LoadSpec { id: u64, source: String },
    /// Cancel a pending request
    CancelRequest(u64),
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// The call produced an HTTP response, whatever its status
    CallCompleted {
        id: u64,
        outcome: CallOutcome,
        time_ms: u64,
    },
    /// The call failed before any HTTP response existed
    CallFailed {
        id: u64,
        message: String,
        time_ms: u64,
    },
    /// Profile fetch finished
    ProfileFetched { id: u64, profile: UserProfile },
    /// Profile fetch failed
    ProfileFailed { id: u64, message: String },
    /// Document load and parse finished
    SpecLoaded { id: u64, spec: Box<ApiSpec> },
    /// Document load or parse failed
    SpecFailed { id: u64, message: String },
    /// Request was cancelled
    Cancelled { id: u64 },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::CallCompleted { id, .. } => *id,
            NetworkResponse::CallFailed { id, .. } => *id,
            NetworkResponse::ProfileFetched { id, .. } => *id,
            NetworkResponse::ProfileFailed { id, .. } => *id,
            NetworkResponse::SpecLoaded { id, .. } => *id,
            NetworkResponse::SpecFailed { id, .. } => *id,
            NetworkResponse::Cancelled { id } => *id,
        }
    }
}
