//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    spec_source: String,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        spec_source: String,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(),
            spec_source,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let source = self.spec_source.clone();
        for cmd in self.state.startup_commands(&source) {
            let _ = self.network_tx.send(cmd);
        }

        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    if let Some(cmd) = self.state.handle_response(response) {
                        let _ = self.network_tx.send(cmd);
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Sidebar
            UiEvent::NextEndpoint => self.state.next_endpoint(),
            UiEvent::PrevEndpoint => self.state.prev_endpoint(),
            UiEvent::SelectEndpoint => {
                if let Some(cmd) = self.state.select_endpoint() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::StartSearch => self.state.start_search(),

            // Form
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::Commit => {
                if let Some(cmd) = self.state.commit() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.cursor_left(),
            UiEvent::CursorRight => self.state.cursor_right(),
            UiEvent::SuggestionUp => self.state.suggestion_up(),
            UiEvent::SuggestionDown => self.state.suggestion_down(),
            UiEvent::SwitchBound => self.state.switch_bound(),

            // Request actions
            UiEvent::TryItOut => {
                if let Some(cmd) = self.state.try_it_out() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::CancelRequest => {
                if let Some(cmd) = self.state.cancel_call() {
                    let _ = self.network_tx.send(cmd);
                }
            }

            // Popups
            UiEvent::OpenKeyEntry => self.state.open_key_entry(),
            UiEvent::ToggleKeyVisibility => self.state.toggle_key_visibility(),
            UiEvent::DismissModal => self.state.dismiss_modal(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
