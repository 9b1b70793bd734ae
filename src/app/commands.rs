//! Command handlers - business logic for processing UI events

use std::sync::OnceLock;

use regex::Regex;

use crate::app::AppState;
use crate::constants::PROFILE_REFRESH_DELAY_MS;
use crate::form::controls::{format_number, ControlDescriptor};
use crate::form::session::{FormItem, FormSession};
use crate::messages::ui_events::{BoundSide, InputMode, Panel};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::build_request;
use crate::profile::token_balance;

impl AppState {
    // ========================
    // Startup
    // ========================

    /// Commands fired once at launch: load the document and refresh
    /// the cached profile when a key is already saved
    pub fn startup_commands(&mut self, spec_source: &str) -> Vec<NetworkCommand> {
        let mut commands = Vec::new();
        self.status_line = Some(format!("Loading {}", spec_source));
        commands.push(NetworkCommand::LoadSpec {
            id: self.next_id(),
            source: spec_source.to_string(),
        });
        if let Some(key) = self.storage.api_key.clone() {
            commands.push(NetworkCommand::FetchProfile {
                id: self.next_id(),
                key,
            });
        }
        commands
    }

    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    // ========================
    // Sidebar and search
    // ========================

    pub fn start_search(&mut self) {
        self.searching = true;
        self.active_panel = Panel::Sidebar;
    }

    /// Esc: close the search and drop the filter
    pub fn exit_search(&mut self) {
        self.searching = false;
        self.search_query.clear();
        self.selected_endpoint = 0;
    }

    /// Enter: close the search, keep the filter
    pub fn finish_search(&mut self) {
        self.searching = false;
        let len = self.flat_len();
        if len > 0 && self.selected_endpoint >= len {
            self.selected_endpoint = len - 1;
        }
    }

    fn search_char(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_endpoint = 0;
    }

    fn search_backspace(&mut self) {
        self.search_query.pop();
        self.selected_endpoint = 0;
    }

    pub fn next_endpoint(&mut self) {
        let len = self.flat_len();
        if len > 0 {
            self.selected_endpoint = (self.selected_endpoint + 1) % len;
        }
    }

    pub fn prev_endpoint(&mut self) {
        let len = self.flat_len();
        if len > 0 {
            self.selected_endpoint = self
                .selected_endpoint
                .checked_sub(1)
                .unwrap_or(len - 1);
        }
    }

    /// Open the selected endpoint's form. Any in-flight call belongs to
    /// the previous endpoint and gets cancelled.
    pub fn select_endpoint(&mut self) -> Option<NetworkCommand> {
        let endpoint = self.flat_endpoint(self.selected_endpoint)?;

        let cancel = self.pending_call.take().map(NetworkCommand::CancelRequest);
        self.is_loading = false;

        let session = FormSession::new(endpoint);
        self.focused_item = session
            .form_items()
            .iter()
            .position(|item| item.focusable())
            .unwrap_or(0);
        self.session = Some(session);
        self.active_panel = Panel::Form;
        self.input_mode = InputMode::Normal;
        self.cursor_position = 0;
        self.active_bound = BoundSide::Min;
        self.suggestion_index = None;
        self.response = None;
        self.response_error = None;
        self.response_time_ms = 0;
        self.response_scroll = 0;

        cancel
    }

    // ========================
    // Form focus
    // ========================

    pub fn next_field(&mut self) {
        let items = match &self.session {
            Some(session) => session.form_items(),
            None => return,
        };
        if items.is_empty() {
            return;
        }
        let mut index = self.focused_item.min(items.len() - 1);
        for _ in 0..items.len() {
            index = (index + 1) % items.len();
            if items[index].focusable() {
                self.focused_item = index;
                break;
            }
        }
        self.reset_control_state();
    }

    pub fn prev_field(&mut self) {
        let items = match &self.session {
            Some(session) => session.form_items(),
            None => return,
        };
        if items.is_empty() {
            return;
        }
        let mut index = self.focused_item.min(items.len() - 1);
        for _ in 0..items.len() {
            index = index.checked_sub(1).unwrap_or(items.len() - 1);
            if items[index].focusable() {
                self.focused_item = index;
                break;
            }
        }
        self.reset_control_state();
    }

    fn reset_control_state(&mut self) {
        self.cursor_position = 0;
        self.suggestion_index = None;
        self.active_bound = BoundSide::Min;
    }

    /// The field selection can grow or shrink the item list, so focus
    /// is clamped after every value write
    fn clamp_focus(&mut self) {
        let len = self
            .session
            .as_ref()
            .map(|session| session.form_items().len())
            .unwrap_or(0);
        if len == 0 {
            self.focused_item = 0;
        } else if self.focused_item >= len {
            self.focused_item = len - 1;
        }
    }

    // ========================
    // Form editing
    // ========================

    pub fn start_editing(&mut self) {
        let item = match self.focused_form_item() {
            Some(item) if item.focusable() => item,
            _ => return,
        };
        self.input_mode = InputMode::Editing;
        self.cursor_position = self
            .focused_value_key()
            .and_then(|key| {
                self.session
                    .as_ref()
                    .map(|session| session.value(&key).len())
            })
            .unwrap_or(0);
        self.suggestion_index = self.initial_suggestion(&item);
    }

    /// Pickers open with the current choice highlighted; free-text
    /// popups stay closed until an arrow key asks for them
    fn initial_suggestion(&self, item: &FormItem) -> Option<usize> {
        let (name, descriptor) = match item {
            FormItem::Control {
                name, descriptor, ..
            } => (name, descriptor),
            _ => return None,
        };
        match descriptor {
            ControlDescriptor::FieldSelect { .. }
            | ControlDescriptor::EnumSelect { .. }
            | ControlDescriptor::MultiPick { .. } => {
                let list = self.suggestion_list();
                if list.is_empty() {
                    return None;
                }
                let current = self
                    .session
                    .as_ref()
                    .map(|session| session.value(name).to_string())
                    .unwrap_or_default();
                Some(list.iter().position(|option| *option == current).unwrap_or(0))
            }
            _ => None,
        }
    }

    pub fn stop_editing(&mut self) {
        if self.searching {
            self.exit_search();
            return;
        }
        if self.input_mode == InputMode::Editing {
            self.discard_unlisted_search_value();
        }
        self.input_mode = InputMode::Normal;
        self.suggestion_index = None;
    }

    /// Enter, routed by what currently has the keyboard
    pub fn commit(&mut self) -> Option<NetworkCommand> {
        if self.show_key_entry {
            return self.commit_api_key();
        }
        if self.searching {
            self.finish_search();
            return None;
        }
        self.commit_edit();
        None
    }

    fn commit_edit(&mut self) {
        if self.input_mode != InputMode::Editing {
            return;
        }
        let item = match self.focused_form_item() {
            Some(item) => item,
            None => {
                self.input_mode = InputMode::Normal;
                return;
            }
        };
        match &item {
            FormItem::Control {
                name, descriptor, ..
            } => match descriptor {
                ControlDescriptor::MultiPick { .. } => {
                    self.toggle_highlighted(name.clone());
                }
                ControlDescriptor::FieldSelect { .. } | ControlDescriptor::EnumSelect { .. } => {
                    let list = self.suggestion_list();
                    if let Some(option) =
                        self.suggestion_index.and_then(|index| list.get(index))
                    {
                        let choice = option.clone();
                        self.cursor_position = choice.len();
                        self.write_form_value(name, choice);
                    }
                    self.input_mode = InputMode::Normal;
                    self.suggestion_index = None;
                }
                ControlDescriptor::BodyEditor { .. } => {
                    // Enter stays inside the JSON editor
                    self.insert_plain('\n');
                }
                ControlDescriptor::SearchSelect { .. } | ControlDescriptor::TextInput { .. } => {
                    let list = self.suggestion_list();
                    match self.suggestion_index.and_then(|index| list.get(index).cloned()) {
                        Some(option) => {
                            self.cursor_position = option.len();
                            self.write_form_value(name, option);
                            self.suggestion_index = None;
                        }
                        None => {
                            if matches!(descriptor, ControlDescriptor::SearchSelect { .. }) {
                                self.discard_unlisted_search_value();
                            }
                            self.input_mode = InputMode::Normal;
                        }
                    }
                }
                _ => self.input_mode = InputMode::Normal,
            },
            _ => self.input_mode = InputMode::Normal,
        }
    }

    /// A search select only keeps values from its list; anything else
    /// typed is dropped when editing ends
    fn discard_unlisted_search_value(&mut self) {
        let item = match self.focused_form_item() {
            Some(item) => item,
            None => return,
        };
        let (name, suggestions) = match &item {
            FormItem::Control {
                name,
                descriptor: ControlDescriptor::SearchSelect { suggestions },
                ..
            } => (name, suggestions),
            _ => return,
        };
        let entered = self
            .session
            .as_ref()
            .map(|session| session.value(name).to_string())
            .unwrap_or_default();
        if entered.is_empty() || suggestions.iter().any(|option| option == &entered) {
            return;
        }
        self.cursor_position = 0;
        self.write_form_value(name, String::new());
    }

    pub fn enter_char(&mut self, c: char) {
        if self.show_key_entry {
            self.key_char(c);
            return;
        }
        if self.searching {
            self.search_char(c);
            return;
        }
        if self.input_mode != InputMode::Editing {
            return;
        }
        let item = match self.focused_form_item() {
            Some(item) => item,
            None => return,
        };
        match &item {
            FormItem::Control {
                name, descriptor, ..
            } => match descriptor {
                ControlDescriptor::MultiPick { .. } => {
                    if c == ' ' {
                        self.toggle_highlighted(name.clone());
                    }
                }
                ControlDescriptor::FieldSelect { .. } | ControlDescriptor::EnumSelect { .. } => {}
                ControlDescriptor::PageInput
                | ControlDescriptor::IntSlider { .. }
                | ControlDescriptor::LimitSlider { .. } => self.insert_filtered(c, integer_text),
                ControlDescriptor::StatsSlider { .. } | ControlDescriptor::CaloriesRange { .. } => {
                    self.insert_filtered(c, decimal_text)
                }
                ControlDescriptor::SearchSelect { .. } | ControlDescriptor::TextInput { .. } => {
                    self.suggestion_index = None;
                    self.insert_plain(c);
                }
                ControlDescriptor::BodyEditor { .. } | ControlDescriptor::MultiText => {
                    self.insert_plain(c)
                }
                ControlDescriptor::Suppressed => {}
            },
            FormItem::Pair(_) => self.insert_filtered(c, decimal_text),
            FormItem::Heading(_) => {}
        }
    }

    pub fn delete_char(&mut self) {
        if self.show_key_entry {
            self.key_backspace();
            return;
        }
        if self.searching {
            self.search_backspace();
            return;
        }
        if self.input_mode != InputMode::Editing {
            return;
        }
        let item = match self.focused_form_item() {
            Some(item) => item,
            None => return,
        };
        // Backspace on a picker clears the choice instead of editing
        // its text
        let clears = matches!(
            &item,
            FormItem::Control {
                descriptor: ControlDescriptor::FieldSelect { .. }
                    | ControlDescriptor::EnumSelect { .. }
                    | ControlDescriptor::MultiPick { .. },
                ..
            }
        );
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return,
        };
        if clears {
            self.cursor_position = 0;
            if let Some(session) = &mut self.session {
                session.set_value(&key, String::new());
            }
            self.clamp_focus();
            return;
        }

        let session = match &mut self.session {
            Some(session) => session,
            None => return,
        };
        let mut value = session.value(&key).to_string();
        if self.cursor_position > value.len() {
            self.cursor_position = value.len();
        }
        if self.cursor_position == 0 {
            return;
        }
        let prev = value[..self.cursor_position]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        value.remove(prev);
        session.set_value(&key, value);
        self.cursor_position = prev;
        self.clamp_focus();
    }

    pub fn cursor_left(&mut self) {
        if self.show_key_entry {
            self.key_cursor_left();
            return;
        }
        if self.searching || self.input_mode != InputMode::Editing {
            return;
        }
        if self.try_adjust_slider(-1.0) {
            return;
        }
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return,
        };
        let session = match &self.session {
            Some(session) => session,
            None => return,
        };
        let value = session.value(&key);
        let pos = self.cursor_position.min(value.len());
        if pos > 0 {
            self.cursor_position = value[..pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn cursor_right(&mut self) {
        if self.show_key_entry {
            self.key_cursor_right();
            return;
        }
        if self.searching || self.input_mode != InputMode::Editing {
            return;
        }
        if self.try_adjust_slider(1.0) {
            return;
        }
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return,
        };
        let session = match &self.session {
            Some(session) => session,
            None => return,
        };
        let value = session.value(&key);
        let pos = self.cursor_position.min(value.len());
        if pos < value.len() {
            self.cursor_position = value[pos..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| pos + i)
                .unwrap_or(value.len());
        }
    }

    pub fn suggestion_up(&mut self) {
        let list = self.suggestion_list();
        if list.is_empty() {
            return;
        }
        self.suggestion_index = Some(match self.suggestion_index {
            Some(index) => index.saturating_sub(1),
            None => 0,
        });
    }

    pub fn suggestion_down(&mut self) {
        let list = self.suggestion_list();
        if list.is_empty() {
            return;
        }
        self.suggestion_index = Some(match self.suggestion_index {
            Some(index) => (index + 1).min(list.len() - 1),
            None => 0,
        });
    }

    /// Tab inside a two-bound block moves between its bounds
    pub fn switch_bound(&mut self) {
        let is_two_bound = matches!(
            self.focused_form_item(),
            Some(FormItem::Pair(_))
                | Some(FormItem::Control {
                    descriptor: ControlDescriptor::CaloriesRange { .. },
                    ..
                })
        );
        if !is_two_bound {
            return;
        }
        self.active_bound = self.active_bound.other();
        self.cursor_position = self
            .focused_value_key()
            .and_then(|key| {
                self.session
                    .as_ref()
                    .map(|session| session.value(&key).len())
            })
            .unwrap_or(0);
    }

    /// Left/Right on a slider row nudges the value one step instead of
    /// moving the text cursor. Returns whether the row was a slider.
    fn try_adjust_slider(&mut self, direction: f64) -> bool {
        let item = match self.focused_form_item() {
            Some(item) => item,
            None => return false,
        };
        let (min, max, step, start) = match slider_profile(&item, self.active_bound) {
            Some(profile) => profile,
            None => return false,
        };
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return true,
        };
        let session = match &mut self.session {
            Some(session) => session,
            None => return true,
        };
        let current = session.value(&key).trim().parse::<f64>().unwrap_or(start);
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let next = (current + direction * step).clamp(lo, hi);
        let rendered = format_number(next, min, max);
        self.cursor_position = rendered.len();
        session.set_value(&key, rendered);
        true
    }

    fn toggle_highlighted(&mut self, name: String) {
        let list = self.suggestion_list();
        let option = match self.suggestion_index.and_then(|index| list.get(index).cloned()) {
            Some(option) => option,
            None => return,
        };
        if let Some(session) = &mut self.session {
            session.toggle_multi(&name, &option);
        }
        self.clamp_focus();
    }

    fn write_form_value(&mut self, key: &str, value: String) {
        if let Some(session) = &mut self.session {
            session.set_value(key, value);
        }
        self.clamp_focus();
    }

    fn insert_plain(&mut self, c: char) {
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return,
        };
        let session = match &mut self.session {
            Some(session) => session,
            None => return,
        };
        let mut value = session.value(&key).to_string();
        if self.cursor_position > value.len() {
            self.cursor_position = value.len();
        }
        value.insert(self.cursor_position, c);
        session.set_value(&key, value);
        self.cursor_position += c.len_utf8();
        self.clamp_focus();
    }

    /// Inserts only when the whole resulting text still passes the
    /// control's character filter
    fn insert_filtered(&mut self, c: char, allowed: fn(&str) -> bool) {
        let key = match self.focused_value_key() {
            Some(key) => key,
            None => return,
        };
        let session = match &mut self.session {
            Some(session) => session,
            None => return,
        };
        let mut candidate = session.value(&key).to_string();
        if self.cursor_position > candidate.len() {
            self.cursor_position = candidate.len();
        }
        candidate.insert(self.cursor_position, c);
        if !allowed(&candidate) {
            return;
        }
        session.set_value(&key, candidate);
        self.cursor_position += c.len_utf8();
        self.clamp_focus();
    }

    // ========================
    // Key entry popup
    // ========================

    pub fn open_key_entry(&mut self) {
        self.show_key_entry = true;
        self.key_input = self.storage.api_key.clone().unwrap_or_default();
        self.key_cursor = self.key_input.len();
        self.key_visible = false;
    }

    pub fn toggle_key_visibility(&mut self) {
        self.key_visible = !self.key_visible;
    }

    pub fn dismiss_modal(&mut self) {
        if self.show_token_modal {
            self.show_token_modal = false;
        } else if self.show_key_entry {
            self.show_key_entry = false;
        }
    }

    fn key_char(&mut self, c: char) {
        if self.key_cursor <= self.key_input.len() {
            self.key_input.insert(self.key_cursor, c);
            self.key_cursor += c.len_utf8();
        }
    }

    fn key_backspace(&mut self) {
        if self.key_cursor > 0 {
            let prev = self.key_input[..self.key_cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.key_input.remove(prev);
            self.key_cursor = prev;
        }
    }

    fn key_cursor_left(&mut self) {
        if self.key_cursor > 0 {
            self.key_cursor = self.key_input[..self.key_cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    fn key_cursor_right(&mut self) {
        if self.key_cursor < self.key_input.len() {
            self.key_cursor = self.key_input[self.key_cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.key_cursor + i)
                .unwrap_or(self.key_input.len());
        }
    }

    /// Save the entered key and refresh the profile with it. The key
    /// stays usable for the session even when the disk write fails.
    fn commit_api_key(&mut self) -> Option<NetworkCommand> {
        let key = self.key_input.trim().to_string();
        self.show_key_entry = false;
        if key.is_empty() {
            return None;
        }
        match self.storage.save_api_key(&key) {
            Ok(()) => self.status_line = Some("API key saved".to_string()),
            Err(e) => {
                self.status_line = Some(format!("Could not save key: {}", e));
                self.storage.api_key = Some(key.clone());
            }
        }
        Some(NetworkCommand::FetchProfile {
            id: self.next_id(),
            key,
        })
    }

    // ========================
    // Dispatch
    // ========================

    /// Runs the endpoint call pipeline: token gate, validation, value
    /// synthesis, request build. The gate fires before validation and
    /// also when no profile has been fetched yet.
    pub fn try_it_out(&mut self) -> Option<NetworkCommand> {
        if self.is_loading || self.session.is_none() || self.spec.is_none() {
            return None;
        }

        let balance = token_balance(self.storage.profile.as_ref());
        if balance == 0 {
            self.show_token_modal = true;
            return None;
        }

        let valid = self
            .session
            .as_mut()
            .map(|session| session.validate())
            .unwrap_or(false);
        if !valid {
            if let Some(index) = self
                .session
                .as_ref()
                .and_then(|session| session.first_error_index())
            {
                self.focused_item = index;
                self.reset_control_state();
            }
            self.active_panel = Panel::Form;
            self.input_mode = InputMode::Normal;
            return None;
        }

        let request = {
            let session = self.session.as_ref()?;
            let spec = self.spec.as_ref()?;
            let values = session.payload();
            build_request(
                spec,
                &session.endpoint,
                &values,
                self.storage.api_key.as_deref(),
            )
        };

        self.pre_call_tokens = balance;
        self.is_loading = true;
        self.response = None;
        self.response_error = None;
        self.response_time_ms = 0;
        self.response_scroll = 0;

        let id = self.next_id();
        self.pending_call = Some(id);
        Some(NetworkCommand::CallEndpoint { id, request })
    }

    /// Cancel the current pending call
    pub fn cancel_call(&mut self) -> Option<NetworkCommand> {
        self.pending_call.map(NetworkCommand::CancelRequest)
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) -> Option<NetworkCommand> {
        match response {
            NetworkResponse::CallCompleted {
                id,
                outcome,
                time_ms,
            } => {
                if self.pending_call != Some(id) {
                    return None;
                }
                self.response = Some(outcome);
                self.response_error = None;
                self.response_time_ms = time_ms;
                self.response_scroll = 0;
                self.is_loading = false;
                self.pending_call = None;

                // Optimistic decrement; the deferred fetch replaces it
                // with the server's number
                if let Some(mut profile) = self.storage.profile.take() {
                    profile.spend_token();
                    if self.storage.save_profile(&profile).is_err() {
                        self.storage.profile = Some(profile);
                    }
                }
                self.storage.api_key.clone().map(|key| {
                    NetworkCommand::RefreshProfileAfter {
                        id: self.next_id(),
                        key,
                        delay_ms: PROFILE_REFRESH_DELAY_MS,
                    }
                })
            }

            NetworkResponse::CallFailed {
                id,
                message,
                time_ms,
            } => {
                if self.pending_call != Some(id) {
                    return None;
                }
                self.response = None;
                self.response_error = Some(message);
                self.response_time_ms = time_ms;
                self.is_loading = false;
                self.pending_call = None;

                // Roll the balance back to its pre-call snapshot
                if let Some(mut profile) = self.storage.profile.take() {
                    profile.tokens = self.pre_call_tokens;
                    if self.storage.save_profile(&profile).is_err() {
                        self.storage.profile = Some(profile);
                    }
                }
                None
            }

            NetworkResponse::Cancelled { id } => {
                if self.pending_call == Some(id) {
                    self.is_loading = false;
                    self.pending_call = None;
                    self.response = None;
                    self.response_error = Some("Request cancelled".to_string());
                    self.response_time_ms = 0;
                }
                None
            }

            NetworkResponse::ProfileFetched { profile, .. } => {
                if self.storage.save_profile(&profile).is_err() {
                    self.storage.profile = Some(profile);
                }
                None
            }

            NetworkResponse::ProfileFailed { message, .. } => {
                self.status_line = Some(format!("Profile: {}", message));
                None
            }

            NetworkResponse::SpecLoaded { spec, .. } => {
                let spec = *spec;
                self.status_line = Some(format!("Loaded {} endpoints", spec.endpoints.len()));
                self.spec = Some(spec);
                self.selected_endpoint = 0;
                None
            }

            NetworkResponse::SpecFailed { message, .. } => {
                self.status_line = Some(message);
                None
            }
        }
    }
}

/// Bounds, step and blank-value start position for slider-like rows
fn slider_profile(item: &FormItem, bound: BoundSide) -> Option<(f64, f64, f64, f64)> {
    match item {
        FormItem::Control { descriptor, .. } => match descriptor {
            ControlDescriptor::StatsSlider {
                min,
                max,
                default,
                step,
                ..
            } => Some((*min, *max, *step, *default)),
            ControlDescriptor::IntSlider {
                min, max, default, ..
            } => Some((*min, *max, 1.0, *default)),
            ControlDescriptor::LimitSlider { min, max, default } => {
                Some((*min, *max, 1.0, *default))
            }
            ControlDescriptor::CaloriesRange {
                min,
                max,
                default_max,
            } => {
                let start = match bound {
                    BoundSide::Min => *min,
                    BoundSide::Max => *default_max,
                };
                Some((*min, *max, (*max - *min) / 100.0, start))
            }
            _ => None,
        },
        FormItem::Pair(pair) => {
            let start = match bound {
                BoundSide::Min => pair.min_bound,
                BoundSide::Max => pair.max_bound,
            };
            Some((
                pair.min_bound,
                pair.max_bound,
                (pair.max_bound - pair.min_bound) / 100.0,
                start,
            ))
        }
        FormItem::Heading(_) => None,
    }
}

/// Whole-value filter for integer controls
fn integer_text(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d*$").unwrap()).is_match(text)
}

/// Whole-value filter for decimal controls
fn decimal_text(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d*\.?\d*$").unwrap())
        .is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::network::CallOutcome;
    use crate::profile::UserProfile;
    use crate::spec::document::{ApiSpec, EndpointSpec, ParameterLocation, ParameterSpec};
    use crate::storage::Storage;
    use serde_json::json;

    fn sample_spec() -> ApiSpec {
        let mut spec = ApiSpec::new();
        spec.title = Some("Food API".to_string());
        spec.version = Some("1.0".to_string());

        let mut recipes = EndpointSpec::new("GET", "/recipes");
        recipes.tags = vec!["Recipes".to_string()];
        let mut title = ParameterSpec::new("title", ParameterLocation::Query);
        title.required = true;
        recipes.parameters = vec![title, ParameterSpec::new("limit", ParameterLocation::Query)];

        let mut flavor = EndpointSpec::new("GET", "/flavor/{id}");
        flavor.tags = vec!["Flavor".to_string()];

        spec.endpoints = vec![recipes, flavor];
        spec
    }

    fn ready_state(dir: &tempfile::TempDir) -> AppState {
        let mut state = AppState::new();
        state.storage = Storage::at(dir.path().to_path_buf());
        state.spec = Some(sample_spec());
        state
    }

    fn with_tokens(state: &mut AppState, tokens: i64) {
        let profile = UserProfile {
            tokens,
            ..UserProfile::default()
        };
        state.storage.save_profile(&profile).unwrap();
    }

    fn dispatch(state: &mut AppState) -> u64 {
        match state.try_it_out() {
            Some(NetworkCommand::CallEndpoint { id, .. }) => id,
            other => panic!("expected a call command, got {:?}", other),
        }
    }

    #[test]
    fn selecting_an_endpoint_builds_a_session_and_focuses_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);

        assert!(state.select_endpoint().is_none());
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.endpoint.path, "/recipes");
        assert_eq!(state.active_panel, Panel::Form);
        // First row is the location heading, focus skips to "title"
        assert_eq!(state.focused_item, 1);
    }

    #[test]
    fn empty_balance_opens_the_token_modal_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        state.select_endpoint();

        // No profile at all counts as an empty balance
        assert!(state.try_it_out().is_none());
        assert!(state.show_token_modal);
        // Validation never ran, so the required title has no error
        assert!(state.session.as_ref().unwrap().errors().is_empty());
    }

    #[test]
    fn invalid_forms_jump_focus_to_the_first_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        with_tokens(&mut state, 3);
        state.select_endpoint();
        state.focused_item = 2;

        assert!(state.try_it_out().is_none());
        assert!(!state.show_token_modal);
        assert_eq!(state.focused_item, 1);
        assert!(state
            .session
            .as_ref()
            .unwrap()
            .error("title")
            .is_some());
        // A rejected form never touches the balance
        assert_eq!(state.storage.profile.as_ref().unwrap().tokens, 3);
    }

    #[test]
    fn a_valid_form_dispatches_and_marks_the_call_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        with_tokens(&mut state, 3);
        state.select_endpoint();
        state
            .session
            .as_mut()
            .unwrap()
            .set_value("title", "taco".to_string());

        let id = dispatch(&mut state);
        assert!(state.is_loading);
        assert_eq!(state.pending_call, Some(id));
        assert_eq!(state.pre_call_tokens, 3);

        // A second press while loading does nothing
        assert!(state.try_it_out().is_none());
    }

    #[test]
    fn completion_spends_a_token_and_schedules_the_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        state.storage.save_api_key("secret").unwrap();
        with_tokens(&mut state, 3);
        state.select_endpoint();
        state
            .session
            .as_mut()
            .unwrap()
            .set_value("title", "taco".to_string());
        let id = dispatch(&mut state);

        let followup = state.handle_response(NetworkResponse::CallCompleted {
            id,
            outcome: CallOutcome {
                status: 200,
                status_text: "OK".to_string(),
                data: json!({"ok": true}),
            },
            time_ms: 12,
        });

        assert!(!state.is_loading);
        assert_eq!(state.storage.profile.as_ref().unwrap().tokens, 2);
        match followup {
            Some(NetworkCommand::RefreshProfileAfter { key, delay_ms, .. }) => {
                assert_eq!(key, "secret");
                assert_eq!(delay_ms, PROFILE_REFRESH_DELAY_MS);
            }
            other => panic!("expected a deferred refresh, got {:?}", other),
        }
    }

    #[test]
    fn failure_restores_the_pre_call_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        with_tokens(&mut state, 5);
        state.select_endpoint();
        state
            .session
            .as_mut()
            .unwrap()
            .set_value("title", "taco".to_string());
        let id = dispatch(&mut state);

        // A refresh from an earlier call may land mid-flight
        with_tokens(&mut state, 3);

        let followup = state.handle_response(NetworkResponse::CallFailed {
            id,
            message: "Connection failed".to_string(),
            time_ms: 30,
        });
        assert!(followup.is_none());
        assert_eq!(state.storage.profile.as_ref().unwrap().tokens, 5);
        assert_eq!(state.response_error.as_deref(), Some("Connection failed"));
    }

    #[test]
    fn stale_responses_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        with_tokens(&mut state, 3);
        state.select_endpoint();
        state
            .session
            .as_mut()
            .unwrap()
            .set_value("title", "taco".to_string());
        let id = dispatch(&mut state);

        state.handle_response(NetworkResponse::CallCompleted {
            id: id + 40,
            outcome: CallOutcome {
                status: 200,
                status_text: "OK".to_string(),
                data: json!(null),
            },
            time_ms: 1,
        });
        assert!(state.is_loading);
        assert_eq!(state.storage.profile.as_ref().unwrap().tokens, 3);
    }

    #[test]
    fn search_narrows_groups_and_resets_the_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        state.selected_endpoint = 1;

        state.start_search();
        for c in "flavor".chars() {
            state.enter_char(c);
        }
        assert_eq!(state.selected_endpoint, 0);
        assert_eq!(state.sidebar_groups().len(), 1);
        assert_eq!(state.sidebar_groups()[0].tag, "Flavor");

        state.commit();
        assert!(!state.searching);
        assert_eq!(state.search_query, "flavor");

        state.start_search();
        state.stop_editing();
        assert!(state.search_query.is_empty());
        assert_eq!(state.sidebar_groups().len(), 2);
    }

    #[test]
    fn slider_rows_step_with_the_cursor_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        state.select_endpoint();

        // Heading, title, limit
        state.next_field();
        assert_eq!(state.focused_item, 2);
        state.start_editing();

        state.cursor_left();
        assert_eq!(state.session.as_ref().unwrap().value("limit"), "9");
        state.cursor_right();
        assert_eq!(state.session.as_ref().unwrap().value("limit"), "10");
        // Upper bound clamps
        state.cursor_right();
        assert_eq!(state.session.as_ref().unwrap().value("limit"), "10");
    }

    #[test]
    fn integer_controls_reject_non_digits() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        state.select_endpoint();
        state.next_field();
        state.start_editing();

        state.enter_char('a');
        assert_eq!(state.session.as_ref().unwrap().value("limit"), "");
        state.enter_char('7');
        assert_eq!(state.session.as_ref().unwrap().value("limit"), "7");
    }

    #[test]
    fn leaving_a_search_select_discards_unlisted_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);
        let mut profile = ParameterSpec::new("profile", ParameterLocation::Query);
        profile.collection_format = Some("single".to_string());
        profile.x_enum_values = vec!["Fruity".to_string(), "Smoky".to_string()];
        state.spec.as_mut().unwrap().endpoints[0].parameters.push(profile);

        state.select_endpoint();
        // Heading, title, profile, limit
        state.focused_item = 2;
        state.start_editing();
        for c in "Fru".chars() {
            state.enter_char(c);
        }
        state.stop_editing();
        assert_eq!(state.session.as_ref().unwrap().value("profile"), "");

        state.start_editing();
        for c in "Fruity".chars() {
            state.enter_char(c);
        }
        state.stop_editing();
        assert_eq!(state.session.as_ref().unwrap().value("profile"), "Fruity");
    }

    #[test]
    fn the_key_popup_commit_saves_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);

        state.open_key_entry();
        for c in " secret ".chars() {
            state.enter_char(c);
        }
        let cmd = state.commit();
        assert!(!state.show_key_entry);
        assert_eq!(state.storage.api_key.as_deref(), Some("secret"));
        match cmd {
            Some(NetworkCommand::FetchProfile { key, .. }) => assert_eq!(key, "secret"),
            other => panic!("expected a profile fetch, got {:?}", other),
        }
    }

    #[test]
    fn startup_loads_the_document_and_refreshes_a_saved_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ready_state(&dir);

        let bare = state.startup_commands("swagger.json");
        assert_eq!(bare.len(), 1);
        assert!(matches!(bare[0], NetworkCommand::LoadSpec { .. }));

        state.storage.save_api_key("secret").unwrap();
        let with_key = state.startup_commands("swagger.json");
        assert_eq!(with_key.len(), 2);
        assert!(matches!(with_key[1], NetworkCommand::FetchProfile { .. }));
    }

    #[test]
    fn loaded_documents_replace_the_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new();
        state.storage = Storage::at(dir.path().to_path_buf());

        state.handle_response(NetworkResponse::SpecLoaded {
            id: 1,
            spec: Box::new(sample_spec()),
        });
        assert!(state.spec.is_some());
        assert_eq!(state.status_line.as_deref(), Some("Loaded 2 endpoints"));

        state.handle_response(NetworkResponse::SpecFailed {
            id: 2,
            message: "no such file".to_string(),
        });
        assert_eq!(state.status_line.as_deref(), Some("no such file"));
    }
}
