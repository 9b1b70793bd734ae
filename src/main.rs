//! Palate TUI - Swagger-driven playground for the flavor data API
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution

mod profile;
mod storage;
mod ui;
mod spec;
mod form;
mod messages;
mod app;
mod network;
mod constants;

use std::io;
use std::time::Duration;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use tokio::sync::mpsc;

use messages::{UiEvent, NetworkCommand, NetworkResponse, RenderState};
use messages::ui_events::{key_to_ui_event, BoundSide, InputMode, Panel};
use app::AppActor;
use network::NetworkActor;
use constants::{APP_VERSION, CALORIES_MAX_KEY, CALORIES_MIN_KEY};
use form::controls::{format_number, ControlDescriptor};
use form::session::FormItem;
use storage::default_config_dir;
use ui::{highlight_json, masked, method_color, slider_track, status_color};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let spec_source = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "swagger.json".to_string());

    // Log to a file in the config dir; stdout belongs to the terminal
    let log_dir = default_config_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::never(log_dir, "palate.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PALATE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(version = APP_VERSION, source = %spec_source, "starting");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(spec_source, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.input_mode,
                    current_state.show_token_modal,
                    current_state.show_key_entry,
                    current_state.searching,
                ) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(0),     // Content
            Constraint::Length(1),  // Status bar
        ])
        .split(area);

    draw_header(f, state, main_chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28),  // Endpoint sidebar
            Constraint::Percentage(40),  // Parameter form
            Constraint::Percentage(32),  // Response
        ])
        .split(main_chunks[1]);

    draw_sidebar(f, state, columns[0]);
    draw_form(f, state, columns[1]);
    draw_response(f, state, columns[2]);

    // Status bar
    draw_status_bar(f, state, main_chunks[2]);

    // Popups
    if suggestions_open(state) {
        draw_suggestion_popup(f, state, columns[1]);
    }

    if state.show_token_modal {
        draw_token_modal(f, area);
    }

    if state.show_key_entry {
        draw_key_entry_popup(f, state, area);
    }
}

fn suggestions_open(state: &RenderState) -> bool {
    state.input_mode == InputMode::Editing
        && state.suggestion_index.is_some()
        && !state.suggestions.is_empty()
        && !state.show_token_modal
        && !state.show_key_entry
}

fn draw_header(f: &mut Frame, state: &RenderState, area: Rect) {
    let title = if state.spec_version.is_empty() {
        format!(" {} ", state.spec_title)
    } else {
        format!(" {} v{} ", state.spec_title, state.spec_version)
    };

    let tokens = match &state.profile {
        Some(profile) if profile.plan.is_empty() => Span::styled(
            format!("Tokens: {}", profile.tokens),
            Style::default().fg(Color::Yellow).bold(),
        ),
        Some(profile) => Span::styled(
            format!("Tokens: {} ({})", profile.tokens, profile.plan),
            Style::default().fg(Color::Yellow).bold(),
        ),
        None => Span::styled("No profile yet", Style::default().fg(Color::DarkGray)),
    };

    let key = if state.has_api_key {
        Span::styled("key saved", Style::default().fg(Color::Green))
    } else {
        Span::styled("no key (press k)", Style::default().fg(Color::Red))
    };

    let line = Line::from(vec![tokens, Span::raw("  |  "), key]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, area);
}

fn draw_sidebar(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    // Search box
    let search_style = if state.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(state.search_query.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" Search (/) "),
    );
    f.render_widget(search, chunks[0]);
    if state.searching {
        let max_x = chunks[0].x + chunks[0].width.saturating_sub(2);
        let cursor_x = (chunks[0].x + 1 + state.search_query.chars().count() as u16).min(max_x);
        f.set_cursor_position(Position::new(cursor_x, chunks[0].y + 1));
    }

    let border_style = if state.active_panel == Panel::Sidebar {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    // Tag headers with their endpoints underneath, flat selection index
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;
    let mut flat = 0usize;
    for group in &state.groups {
        lines.push(Line::from(Span::styled(
            group.tag.clone(),
            Style::default().fg(Color::Cyan).bold(),
        )));
        for entry in &group.endpoints {
            let selected = flat == state.selected_endpoint;
            if selected {
                selected_line = lines.len();
            }
            let marker = if selected { "> " } else { "  " };
            let method = Span::styled(
                format!("{}{:6}", marker, entry.method),
                Style::default().fg(method_color(&entry.method)).bold(),
            );
            let path_style = if entry.deprecated {
                Style::default().fg(Color::DarkGray).crossed_out()
            } else if selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                method,
                Span::styled(format!(" {}", entry.path), path_style),
            ]));
            if selected {
                if let Some(summary) = &entry.summary {
                    lines.push(Line::from(Span::styled(
                        format!("        {}", summary),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
            flat += 1;
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No endpoints loaded",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let inner_height = chunks[1].height.saturating_sub(2) as usize;
    let scroll = selected_line.saturating_sub(inner_height / 2) as u16;

    let list = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(" Endpoints ({}) ", flat)),
        )
        .scroll((scroll, 0));
    f.render_widget(list, chunks[1]);
}

fn draw_form(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Form;
    let border_style = if is_focused && state.input_mode == InputMode::Editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(7)])
        .split(area);

    let (title, title_style) = match &state.endpoint {
        Some(endpoint) => {
            let loading = if state.is_loading { " [...]" } else { "" };
            let deprecated = if endpoint.deprecated { " (deprecated)" } else { "" };
            (
                format!(" {} {}{}{} ", endpoint.method, endpoint.path, deprecated, loading),
                Style::default().fg(method_color(&endpoint.method)).bold(),
            )
        }
        None => (" Parameters ".to_string(), Style::default()),
    };

    let (lines, focus_line) = form_lines(state);
    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = focus_line.saturating_sub(inner_height / 2) as u16;

    let body = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title)
                .title_style(title_style),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(body, chunks[0]);

    draw_detail(f, state, chunks[1]);
}

/// Renders every form item to lines and reports which line holds the
/// focused row
fn form_lines(state: &RenderState) -> (Vec<Line<'static>>, usize) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut focus_line = 0usize;

    if state.endpoint.is_none() {
        lines.push(Line::from(Span::styled(
            "Select an endpoint from the sidebar (Enter)",
            Style::default().fg(Color::DarkGray),
        )));
        return (lines, 0);
    }
    if state.form_items.is_empty() {
        lines.push(Line::from(Span::styled(
            "This endpoint takes no parameters. Press 's' to call it.",
            Style::default().fg(Color::DarkGray),
        )));
        return (lines, 0);
    }

    for (i, item) in state.form_items.iter().enumerate() {
        let focused = i == state.focused_item;
        match item {
            FormItem::Heading(text) => {
                if !lines.is_empty() {
                    lines.push(Line::default());
                }
                lines.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default().fg(Color::Cyan).bold(),
                )));
            }
            FormItem::Control {
                name,
                required,
                descriptor,
                ..
            } => {
                if focused {
                    focus_line = lines.len();
                }
                control_lines(state, &mut lines, name, *required, descriptor, focused);
            }
            FormItem::Pair(pair) => {
                if focused {
                    focus_line = lines.len();
                }
                range_rows(
                    state,
                    &mut lines,
                    label_span(&pair.label, pair.required, focused),
                    (pair.min_bound, pair.max_bound),
                    (pair.min_bound, pair.max_bound),
                    &pair.min_key,
                    &pair.max_key,
                    focused,
                );
            }
        }

        // Validation messages under the row; a pair stores the same
        // message under both keys
        let mut errors: Vec<&String> = item
            .value_keys()
            .iter()
            .filter_map(|key| state.form_errors.get(*key))
            .collect();
        errors.dedup();
        for message in errors {
            lines.push(Line::from(Span::styled(
                format!("      {}", message),
                Style::default().fg(Color::Red),
            )));
        }
    }

    (lines, focus_line)
}

fn control_lines(
    state: &RenderState,
    lines: &mut Vec<Line<'static>>,
    name: &str,
    required: bool,
    descriptor: &ControlDescriptor,
    focused: bool,
) {
    let editing = focused && state.input_mode == InputMode::Editing;
    let value = state.form_values.get(name).cloned().unwrap_or_default();
    let label = label_span(name, required, focused);

    match descriptor {
        ControlDescriptor::FieldSelect { .. }
        | ControlDescriptor::EnumSelect { .. }
        | ControlDescriptor::MultiPick { .. } => {
            let shown = if value.is_empty() {
                Span::styled("(none) v", Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(format!("{} v", value))
            };
            lines.push(Line::from(vec![label, Span::raw(": "), shown]));
        }
        ControlDescriptor::SearchSelect { .. } => {
            lines.push(text_row(label, &value, "type to search", editing, state.cursor_position));
        }
        ControlDescriptor::TextInput { placeholder, .. } => {
            lines.push(text_row(label, &value, placeholder, editing, state.cursor_position));
        }
        ControlDescriptor::MultiText => {
            lines.push(text_row(label, &value, "comma, separated", editing, state.cursor_position));
        }
        ControlDescriptor::PageInput => {
            lines.push(text_row(label, &value, "1", editing, state.cursor_position));
        }
        ControlDescriptor::LimitSlider { min, max, default } => {
            let fallback = format_number(*default, *min, *max);
            lines.push(slider_row(label, &value, *min, *max, *default, &fallback, editing, state.cursor_position));
        }
        ControlDescriptor::StatsSlider { min, max, default, placeholder, .. }
        | ControlDescriptor::IntSlider { min, max, default, placeholder } => {
            lines.push(slider_row(label, &value, *min, *max, *default, placeholder, editing, state.cursor_position));
        }
        ControlDescriptor::CaloriesRange { min, max, default_max } => {
            range_rows(
                state,
                lines,
                label,
                (*min, *max),
                (*min, *default_max),
                CALORIES_MIN_KEY,
                CALORIES_MAX_KEY,
                focused,
            );
        }
        ControlDescriptor::BodyEditor { .. } => {
            lines.push(Line::from(label));
            let text = if editing {
                with_cursor(&value, state.cursor_position)
            } else {
                value.clone()
            };
            for body_line in text.lines() {
                lines.push(Line::from(format!("    {}", body_line)));
            }
        }
        ControlDescriptor::Suppressed => {}
    }
}

/// Min/Max rows with a slider track per bound, shared by derived pairs
/// and the calories control
#[allow(clippy::too_many_arguments)]
fn range_rows(
    state: &RenderState,
    lines: &mut Vec<Line<'static>>,
    label: Span<'static>,
    bounds: (f64, f64),
    blanks: (f64, f64),
    min_key: &str,
    max_key: &str,
    focused: bool,
) {
    lines.push(Line::from(label));

    let editing = focused && state.input_mode == InputMode::Editing;
    let min_raw = state.form_values.get(min_key).cloned().unwrap_or_default();
    let max_raw = state.form_values.get(max_key).cloned().unwrap_or_default();
    let inverted = matches!(
        (min_raw.trim().parse::<f64>(), max_raw.trim().parse::<f64>()),
        (Ok(lo), Ok(hi)) if lo > hi
    );

    for (side, raw, blank) in [
        (BoundSide::Min, min_raw, blanks.0),
        (BoundSide::Max, max_raw, blanks.1),
    ] {
        let active = focused && state.active_bound == side;
        let numeric = raw.trim().parse::<f64>().unwrap_or(blank);
        let display = if active && editing {
            with_cursor(&raw, state.cursor_position)
        } else if raw.is_empty() {
            format_number(blank, bounds.0, bounds.1)
        } else {
            raw.clone()
        };
        let side_label = match side {
            BoundSide::Min => "Min",
            BoundSide::Max => "Max",
        };
        let marker = if active { "> " } else { "  " };
        let style = if active {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("    {}{} ", marker, side_label), style),
            Span::styled(
                slider_track(numeric, bounds.0, bounds.1, 14),
                Style::default().fg(Color::Blue),
            ),
            Span::styled(format!(" {}", display), style),
        ]));
    }

    if inverted {
        lines.push(Line::from(Span::styled(
            "      Min cannot be greater than Max",
            Style::default().fg(Color::Red),
        )));
    }
}

fn label_span(name: &str, required: bool, focused: bool) -> Span<'static> {
    let marker = if focused { "> " } else { "  " };
    let text = if required {
        format!("{}{} *", marker, name)
    } else {
        format!("{}{}", marker, name)
    };
    let style = if focused {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default()
    };
    Span::styled(text, style)
}

fn text_row(
    label: Span<'static>,
    value: &str,
    placeholder: &str,
    editing: bool,
    cursor: usize,
) -> Line<'static> {
    let shown = if editing {
        Span::raw(with_cursor(value, cursor))
    } else if value.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value.to_string())
    };
    Line::from(vec![label, Span::raw(": "), shown])
}

#[allow(clippy::too_many_arguments)]
fn slider_row(
    label: Span<'static>,
    value: &str,
    min: f64,
    max: f64,
    default: f64,
    placeholder: &str,
    editing: bool,
    cursor: usize,
) -> Line<'static> {
    let numeric = value.trim().parse::<f64>().unwrap_or(default);
    let shown = if editing {
        Span::raw(format!(" {}", with_cursor(value, cursor)))
    } else if value.is_empty() {
        Span::styled(format!(" {}", placeholder), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(format!(" {}", value))
    };
    Line::from(vec![
        label,
        Span::raw(": "),
        Span::styled(slider_track(numeric, min, max, 14), Style::default().fg(Color::Blue)),
        shown,
    ])
}

/// Inline cursor marker for values edited inside multi-row panes
fn with_cursor(value: &str, cursor: usize) -> String {
    let at = cursor.min(value.len());
    format!("{}|{}", &value[..at], &value[at..])
}

fn draw_detail(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    match (state.endpoint.as_ref(), state.form_items.get(state.focused_item)) {
        (Some(endpoint), Some(FormItem::Control { name, descriptor, .. })) => {
            if let ControlDescriptor::BodyEditor { helper, .. } = descriptor {
                for helper_line in helper.lines() {
                    lines.push(Line::from(helper_line.to_string()));
                }
            } else if let Some(param) = endpoint.parameter(name) {
                let required = if param.required { "yes" } else { "no" };
                let type_text = match &param.format {
                    Some(format) => format!("{} ({})", param.param_type, format),
                    None => param.param_type.clone(),
                };
                lines.push(Line::from(format!(
                    "In: {}   Type: {}   Required: {}",
                    param.location.detail_label(),
                    type_text,
                    required
                )));
                lines.push(Line::from(format!("Example: {}", param.example_hint())));
                if let Some(description) = &param.description {
                    lines.push(Line::from(description.clone()));
                }
            }
        }
        (Some(_), Some(FormItem::Pair(pair))) => {
            lines.push(Line::from(format!(
                "Range: {} - {}",
                format_number(pair.min_bound, pair.min_bound, pair.max_bound),
                format_number(pair.max_bound, pair.min_bound, pair.max_bound)
            )));
            if let Some(description) = &pair.description {
                lines.push(Line::from(description.clone()));
            }
            lines.push(Line::from(Span::styled(
                "Blank bounds are filled from the resolved statistics",
                Style::default().fg(Color::DarkGray),
            )));
        }
        _ => {
            if let Some(endpoint) = &state.endpoint {
                lines.push(Line::from(endpoint.display_title()));
                if let Some(description) = &endpoint.description {
                    lines.push(Line::from(description.clone()));
                }
            }
        }
    }

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, area);
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let border_style = if state.active_panel == Panel::Response {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let title = match &state.response {
        Some(outcome) => Span::styled(
            format!(" {} {} ", outcome.status, outcome.status_text),
            Style::default().fg(status_color(outcome.status)).bold(),
        ),
        None if state.response_error.is_some() => {
            Span::styled(" Error ", Style::default().fg(Color::Red).bold())
        }
        None => Span::raw(" Response "),
    };

    let time_text = if state.response_time_ms > 0 {
        format!(" {}ms ", state.response_time_ms)
    } else {
        String::new()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_bottom(Line::from(time_text).right_aligned());

    let lines = if let Some(message) = &state.response_error {
        vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))]
    } else if let Some(outcome) = &state.response {
        // Use syntax highlighting for JSON
        let pretty = serde_json::to_string_pretty(&outcome.data)
            .unwrap_or_else(|_| outcome.data.to_string());
        highlight_json(&pretty)
    } else if state.is_loading {
        vec![Line::from(Span::styled(
            "Calling...",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        vec![Line::from(Span::styled(
            "Press 's' to call the selected endpoint",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.searching {
        " Type to filter | Enter:keep Esc:clear ".to_string()
    } else if state.input_mode == InputMode::Editing {
        " Esc:done | Enter:commit | Tab:min/max | arrows:move/adjust ".to_string()
    } else if state.is_loading {
        " Calling... Ctrl+X:cancel ".to_string()
    } else if let Some(line) = &state.status_line {
        format!(" {} ", line)
    } else {
        " Tab:panel | Enter:open | /:search | e:edit | s:call | k:key | q:quit ".to_string()
    };

    let bar = Paragraph::new(status)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn focused_control(state: &RenderState) -> Option<(&str, &ControlDescriptor)> {
    match state.form_items.get(state.focused_item) {
        Some(FormItem::Control { name, descriptor, .. }) => Some((name.as_str(), descriptor)),
        _ => None,
    }
}

fn draw_suggestion_popup(f: &mut Frame, state: &RenderState, form_area: Rect) {
    let popup_area = centered_rect(70, 60, form_area);

    let multi = matches!(
        focused_control(state),
        Some((_, ControlDescriptor::MultiPick { .. }))
    );
    let picked: Vec<String> = if multi {
        focused_control(state)
            .and_then(|(name, _)| state.form_values.get(name))
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let items: Vec<Line> = state
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let highlighted = state.suggestion_index == Some(i);
            let style = if highlighted {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            let prefix = if multi {
                if picked.iter().any(|entry| entry == option) {
                    "[x] "
                } else {
                    "[ ] "
                }
            } else if highlighted {
                "> "
            } else {
                "  "
            };
            Line::from(Span::styled(format!("{}{}", prefix, option), style))
        })
        .collect();

    let title = if multi {
        " Options (Space:toggle | Esc:done) "
    } else {
        " Suggestions (Enter:pick) "
    };

    let inner_height = popup_area.height.saturating_sub(2) as usize;
    let scroll = state
        .suggestion_index
        .unwrap_or(0)
        .saturating_sub(inner_height / 2) as u16;

    let list = Paragraph::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().bg(Color::Black)),
        )
        .scroll((scroll, 0));

    f.render_widget(Clear, popup_area);
    f.render_widget(list, popup_area);
}

fn draw_token_modal(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 30, area);

    let text = vec![
        Line::default(),
        Line::from(Span::styled(
            "You are out of tokens",
            Style::default().fg(Color::Red).bold(),
        )),
        Line::default(),
        Line::from("Every live call spends one token and your balance is empty."),
        Line::from("Upgrade your plan on the platform dashboard to keep exploring."),
        Line::default(),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let modal = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Tokens ")
                .style(Style::default().bg(Color::Black)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(modal, popup_area);
}

fn draw_key_entry_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 20, area);

    let shown = if state.key_visible {
        state.key_input.clone()
    } else {
        masked(&state.key_input)
    };

    let text = vec![
        Line::from(shown),
        Line::default(),
        Line::from(Span::styled(
            "Enter your API key without the Bearer prefix.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let input = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" API Key (Enter:save | Tab:show/hide | Esc:cancel) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);

    let cursor_chars = state.key_input[..state.key_cursor.min(state.key_input.len())]
        .chars()
        .count() as u16;
    let max_x = popup_area.x + popup_area.width.saturating_sub(2);
    let cursor_x = (popup_area.x + 1 + cursor_chars).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, popup_area.y + 1));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
