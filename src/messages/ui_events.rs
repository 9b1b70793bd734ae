//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,
    ScrollUp,
    ScrollDown,

    // Sidebar
    NextEndpoint,
    PrevEndpoint,
    SelectEndpoint,
    StartSearch,

    // Form
    NextField,
    PrevField,
    StartEditing,
    StopEditing,
    /// Enter while editing: accept the value, close popups
    Commit,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,
    SuggestionUp,
    SuggestionDown,
    /// Tab inside a range block: switch between the two bounds
    SwitchBound,

    // Actions
    TryItOut,
    CancelRequest,
    OpenKeyEntry,
    ToggleKeyVisibility,
    DismissModal,

    // System
    Quit,
}

/// Active panel in the UI (needed for context-aware event mapping)
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Panel {
    Sidebar,
    Form,
    Response,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Sidebar => Panel::Form,
            Panel::Form => Panel::Response,
            Panel::Response => Panel::Sidebar,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Sidebar => Panel::Response,
            Panel::Form => Panel::Sidebar,
            Panel::Response => Panel::Form,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Which bound of a range block is being edited
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum BoundSide {
    #[default]
    Min,
    Max,
}

impl BoundSide {
    pub fn other(&self) -> BoundSide {
        match self {
            BoundSide::Min => BoundSide::Max,
            BoundSide::Max => BoundSide::Min,
        }
    }
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    input_mode: InputMode,
    show_token_modal: bool,
    show_key_entry: bool,
    searching: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('x') => return Some(UiEvent::CancelRequest),
            KeyCode::Char('k') => return Some(UiEvent::StartSearch),
            _ => {}
        }
    }

    // The token modal swallows everything and dismisses itself
    if show_token_modal {
        return Some(UiEvent::DismissModal);
    }

    if show_key_entry {
        return match key.code {
            KeyCode::Esc => Some(UiEvent::DismissModal),
            KeyCode::Enter => Some(UiEvent::Commit),
            KeyCode::Tab => Some(UiEvent::ToggleKeyVisibility),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        };
    }

    if searching {
        return match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Enter => Some(UiEvent::Commit),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Up => Some(UiEvent::PrevEndpoint),
            KeyCode::Down => Some(UiEvent::NextEndpoint),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        };
    }

    match input_mode {
        InputMode::Normal => normal_mode_event(key, active_panel),
        InputMode::Editing => editing_mode_event(key),
    }
}

fn normal_mode_event(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('/') => Some(UiEvent::StartSearch),
        KeyCode::Char('k') => Some(UiEvent::OpenKeyEntry),
        KeyCode::Char('s') => Some(UiEvent::TryItOut),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char('e') | KeyCode::Enter => match active_panel {
            Panel::Sidebar => Some(UiEvent::SelectEndpoint),
            Panel::Form => Some(UiEvent::StartEditing),
            Panel::Response => None,
        },
        KeyCode::Up => match active_panel {
            Panel::Sidebar => Some(UiEvent::PrevEndpoint),
            Panel::Form => Some(UiEvent::PrevField),
            Panel::Response => Some(UiEvent::ScrollUp),
        },
        KeyCode::Down => match active_panel {
            Panel::Sidebar => Some(UiEvent::NextEndpoint),
            Panel::Form => Some(UiEvent::NextField),
            Panel::Response => Some(UiEvent::ScrollDown),
        },
        _ => None,
    }
}

fn editing_mode_event(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Enter => Some(UiEvent::Commit),
        KeyCode::Tab => Some(UiEvent::SwitchBound),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Up => Some(UiEvent::SuggestionUp),
        KeyCode::Down => Some(UiEvent::SuggestionDown),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}
