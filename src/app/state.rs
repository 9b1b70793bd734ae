//! App state - pure data structure with no I/O logic

use std::collections::HashMap;

use crate::constants::{APP_NAME, CALORIES_MAX_KEY, CALORIES_MIN_KEY};
use crate::form::controls::ControlDescriptor;
use crate::form::session::{FormItem, FormSession};
use crate::messages::network::CallOutcome;
use crate::messages::render::{SidebarEntry, SidebarGroup};
use crate::messages::ui_events::{BoundSide, InputMode, Panel};
use crate::messages::RenderState;
use crate::spec::document::{ApiSpec, EndpointSpec};
use crate::storage::Storage;

/// Main application state - pure data, no I/O
pub struct AppState {
    // Loaded document
    pub spec: Option<ApiSpec>,

    // Persisted key and cached profile
    pub storage: Storage,

    // Sidebar
    pub search_query: String,
    pub searching: bool,
    /// Flat index over the filtered endpoint rows
    pub selected_endpoint: usize,

    // Form
    pub session: Option<FormSession>,
    pub focused_item: usize,
    pub cursor_position: usize,
    pub active_bound: BoundSide,
    pub suggestion_index: Option<usize>,

    // UI focus
    pub active_panel: Panel,
    pub input_mode: InputMode,

    // Call lifecycle
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_call: Option<u64>,
    /// Token balance snapshot taken when a call is dispatched
    pub pre_call_tokens: i64,

    // Response pane
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

    // Footer status line
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            spec: None,
            storage: Storage::new(),
            search_query: String::new(),
            searching: false,
            selected_endpoint: 0,
            session: None,
            focused_item: 0,
            cursor_position: 0,
            active_bound: BoundSide::Min,
            suggestion_index: None,
            active_panel: Panel::Sidebar,
            input_mode: InputMode::Normal,
            is_loading: false,
            next_request_id: 1,
            pending_call: None,
            pre_call_tokens: 0,
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

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Sidebar groups after the search filter
    pub fn sidebar_groups(&self) -> Vec<SidebarGroup> {
        let spec = match &self.spec {
            Some(spec) => spec,
            None => return Vec::new(),
        };
        spec.filtered_groups(&self.search_query)
            .into_iter()
            .map(|(tag, endpoints)| SidebarGroup {
                tag,
                endpoints: endpoints
                    .into_iter()
                    .map(|endpoint| SidebarEntry {
                        method: endpoint.method.clone(),
                        path: endpoint.path.clone(),
                        summary: endpoint.summary.clone(),
                        deprecated: endpoint.deprecated,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Number of selectable endpoint rows under the current filter
    pub fn flat_len(&self) -> usize {
        match &self.spec {
            Some(spec) => spec
                .filtered_groups(&self.search_query)
                .iter()
                .map(|(_, endpoints)| endpoints.len())
                .sum(),
            None => 0,
        }
    }

    /// Endpoint at a flat index over the filtered groups
    pub fn flat_endpoint(&self, index: usize) -> Option<EndpointSpec> {
        let spec = self.spec.as_ref()?;
        let mut remaining = index;
        for (_, endpoints) in spec.filtered_groups(&self.search_query) {
            if remaining < endpoints.len() {
                return Some(endpoints[remaining].clone());
            }
            remaining -= endpoints.len();
        }
        None
    }

    /// The form row focus currently sits on
    pub fn focused_form_item(&self) -> Option<FormItem> {
        let session = self.session.as_ref()?;
        session.form_items().into_iter().nth(self.focused_item)
    }

    /// Key the focused row reads and writes. Two-bound blocks resolve
    /// through the active bound.
    pub fn focused_value_key(&self) -> Option<String> {
        match self.focused_form_item()? {
            FormItem::Heading(_) => None,
            FormItem::Control {
                descriptor: ControlDescriptor::CaloriesRange { .. },
                ..
            } => Some(
                match self.active_bound {
                    BoundSide::Min => CALORIES_MIN_KEY,
                    BoundSide::Max => CALORIES_MAX_KEY,
                }
                .to_string(),
            ),
            FormItem::Control { name, .. } => Some(name),
            FormItem::Pair(pair) => Some(match self.active_bound {
                BoundSide::Min => pair.min_key,
                BoundSide::Max => pair.max_key,
            }),
        }
    }

    /// Popup entries for the focused control. Pickers list their
    /// options as they are; free-text controls narrow their known
    /// values by the entered text.
    pub fn suggestion_list(&self) -> Vec<String> {
        let session = match &self.session {
            Some(session) => session,
            None => return Vec::new(),
        };
        let items = session.form_items();
        let item = match items.get(self.focused_item) {
            Some(item) => item,
            None => return Vec::new(),
        };
        match item {
            FormItem::Control {
                name, descriptor, ..
            } => match descriptor {
                ControlDescriptor::FieldSelect { options }
                | ControlDescriptor::EnumSelect { options } => options.clone(),
                ControlDescriptor::MultiPick { suggestions } => suggestions.clone(),
                ControlDescriptor::SearchSelect { suggestions }
                | ControlDescriptor::TextInput { suggestions, .. } => {
                    let needle = session.value(name).to_lowercase();
                    if needle.is_empty() {
                        suggestions.clone()
                    } else {
                        suggestions
                            .iter()
                            .filter(|option| option.to_lowercase().contains(&needle))
                            .cloned()
                            .collect()
                    }
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let (spec_title, spec_version) = match &self.spec {
            Some(spec) => (
                spec.title.clone().unwrap_or_else(|| APP_NAME.to_string()),
                spec.version.clone().unwrap_or_default(),
            ),
            None => (APP_NAME.to_string(), String::new()),
        };

        let (endpoint, form_items, form_values, form_errors) = match &self.session {
            Some(session) => (
                Some(session.endpoint.clone()),
                session.form_items(),
                session.values().clone(),
                session.errors().clone(),
            ),
            None => (None, Vec::new(), HashMap::new(), HashMap::new()),
        };

        RenderState {
            spec_title,
            spec_version,
            profile: self.storage.profile.clone(),
            has_api_key: self.storage.api_key.is_some(),
            groups: self.sidebar_groups(),
            selected_endpoint: self.selected_endpoint,
            search_query: self.search_query.clone(),
            searching: self.searching,
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            endpoint,
            form_items,
            form_values,
            form_errors,
            focused_item: self.focused_item,
            cursor_position: self.cursor_position,
            active_bound: self.active_bound,
            suggestion_index: self.suggestion_index,
            suggestions: self.suggestion_list(),
            is_loading: self.is_loading,
            response: self.response.clone(),
            response_error: self.response_error.clone(),
            response_time_ms: self.response_time_ms,
            response_scroll: self.response_scroll,
            show_token_modal: self.show_token_modal,
            show_key_entry: self.show_key_entry,
            key_input: self.key_input.clone(),
            key_visible: self.key_visible,
            key_cursor: self.key_cursor,
            status_line: self.status_line.clone(),
        }
    }
}
