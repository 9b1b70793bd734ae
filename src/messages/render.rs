//! Render state - data structure sent from App layer to UI for rendering

use std::collections::HashMap;

use crate::form::session::FormItem;
use crate::messages::network::CallOutcome;
use crate::messages::ui_events::{BoundSide, InputMode, Panel};
use crate::profile::UserProfile;
use crate::spec::document::EndpointSpec;

/// One sidebar tag group
#[derive(Debug, Clone)]
pub struct SidebarGroup {
    pub tag: String,
    pub endpoints: Vec<SidebarEntry>,
}

/// One selectable endpoint row
#[derive(Debug, Clone)]
pub struct SidebarEntry {
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub deprecated: bool,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    // Header
    pub spec_title: String,
    pub spec_version: String,
    pub profile: Option<UserProfile>,
    pub has_api_key: bool,

    // Sidebar
    pub groups: Vec<SidebarGroup>,
    /// Flat index over the filtered endpoint rows
    pub selected_endpoint: usize,
    pub search_query: String,
    pub searching: bool,

    // Focus
    pub active_panel: Panel,
    pub input_mode: InputMode,

    // Form
    pub endpoint: Option<EndpointSpec>,
    pub form_items: Vec<FormItem>,
    pub form_values: HashMap<String, String>,
    pub form_errors: HashMap<String, String>,
    pub focused_item: usize,
    pub cursor_position: usize,
    pub active_bound: BoundSide,
    pub suggestion_index: Option<usize>,
    /// Popup entries for the focused control
    pub suggestions: Vec<String>,

    // Response
    pub is_loading: bool,
    pub response: Option<CallOutcome>,
    pub response_error: Option<String>,
    pub response_time_ms: u64,
    pub response_scroll: u16,

    // Popups
    pub show_token_modal: bool,
    pub show_key_entry: bool,
    pub key_input: String,
    pub key_visible: bool,
    pub key_cursor: usize,

    // Transient status line
    pub status_line: Option<String>,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            spec_title: String::new(),
            spec_version: String::new(),
            profile: None,
            has_api_key: false,
            groups: Vec::new(),
            selected_endpoint: 0,
            search_query: String::new(),
            searching: false,
            active_panel: Panel::Sidebar,
            input_mode: InputMode::Normal,
            endpoint: None,
            form_items: Vec::new(),
            form_values: HashMap::new(),
            form_errors: HashMap::new(),
            focused_item: 0,
            cursor_position: 0,
            active_bound: BoundSide::Min,
            suggestion_index: None,
            suggestions: Vec::new(),
            is_loading: false,
            response: None,
            response_error: None,
            response_time_ms: 0,
            response_scroll: 0,
            show_token_modal: false,
            show_key_entry: false,
            key_input: String::new(),
            key_visible: false,
            key_cursor: 0,
            status_line: None,
        }
    }
}
