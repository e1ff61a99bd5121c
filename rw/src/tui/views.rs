//! TUI views and rendering
//!
//! All rendering logic is contained here. Views draw from the AppState and
//! the session but never modify either.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::trace;

use super::state::{AppState, ConfirmDialog, InteractionMode, type_choices};
use crate::domain::{BudgetTier, LocalSearchResult, PlanPhase, RestorationPlan, SiteAnalysis};
use crate::session::{FlowState, NoticeLevel, Session};

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const DONE: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const LEAF: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const WARN: Color = Color::Rgb(255, 215, 0); // Gold
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

/// Main render function
pub fn render(state: &AppState, session: &Session, frame: &mut Frame) {
    trace!(flow = %session.state(), "render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, session, frame, chunks[0]);

    match session.state() {
        FlowState::Idle => render_upload(state, session, frame, chunks[1]),
        FlowState::Analyzing => render_busy(state, "Analyzing your site", frame, chunks[1]),
        FlowState::ReviewAnalysis => render_review(state, session, frame, chunks[1]),
        FlowState::GeneratingVision => {
            let project = session.project();
            let message = match (project.restoration_type, project.budget) {
                (Some(t), Some(b)) => format!("Imagining your {} and drafting a {} plan", t, b),
                _ => "Generating vision and plan".to_string(),
            };
            render_busy(state, &message, frame, chunks[1]);
        }
        FlowState::Complete => render_plan(state, session, frame, chunks[1]),
    }

    render_footer(state, session, frame, chunks[2]);

    match &state.interaction_mode {
        InteractionMode::Help => render_help_overlay(frame, frame.area()),
        InteractionMode::Confirm(dialog) => render_confirm_dialog(dialog, frame, frame.area()),
        _ => {}
    }
}

/// Header with the step breadcrumb and the location
fn render_header(state: &AppState, session: &Session, frame: &mut Frame, area: Rect) {
    trace!("render_header: called");
    let current = session.state();
    let current_pos = FlowState::ALL.iter().position(|s| *s == current).unwrap_or(0);

    let mut left = vec![
        Span::styled(" 🌱 rewild", Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
    ];
    for (i, step) in FlowState::ALL.iter().enumerate() {
        if i > 0 {
            left.push(Span::styled(" › ", Style::default().fg(colors::DIM)));
        }
        let style = if i == current_pos {
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD)
        } else if i < current_pos {
            Style::default().fg(colors::DONE)
        } else {
            Style::default().fg(colors::DIM)
        };
        left.push(Span::styled(step.label(), style));
    }

    let right = match (session.location(), state.locating) {
        (_, true) => Line::from(Span::styled(
            format!("{} locating ", state.spinner()),
            Style::default().fg(colors::WARN),
        )),
        (Some(loc), false) => Line::from(Span::styled(format!("📍 {} ", loc), Style::default().fg(colors::LEAF))),
        (None, false) => Line::from(Span::styled("no location [g] ", Style::default().fg(colors::DIM))),
    };

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right.width() as u16)])
        .split(inner);
    frame.render_widget(Paragraph::new(Line::from(left)), chunks[0]);
    frame.render_widget(Paragraph::new(right), chunks[1]);
}

fn render_upload(state: &AppState, session: &Session, frame: &mut Frame, area: Rect) {
    trace!("render_upload: called");
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Turn grey into green",
            Style::default().fg(colors::LEAF).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Start with a photo of a paved yard, parking lot, schoolyard or street corner."),
        Line::from("The AI assesses the site, suggests how to restore it, shows what it could"),
        Line::from("look like, and drafts a phased plan with costs and local help."),
        Line::from(""),
        key_line("o", "Open a photo from disk"),
        key_line("d", "Use the demo photo"),
        key_line("g", "Share your location (better plants, prices and local services)"),
    ];

    if state.fetching_demo {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} Downloading demo photo", state.spinner()),
            Style::default().fg(colors::WARN),
        )));
    }
    if let Some(loc) = session.location() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Location: {}", loc),
            Style::default().fg(colors::DIM),
        )));
    }

    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Upload "));
    frame.render_widget(para, area);
}

fn render_busy(state: &AppState, message: &str, frame: &mut Frame, area: Rect) {
    trace!(%message, "render_busy: called");
    let inner = area.inner(Margin {
        horizontal: 2,
        vertical: area.height / 3,
    });
    let lines = vec![
        Line::from(Span::styled(
            format!("{} {}", state.spinner(), message),
            Style::default().fg(colors::LEAF).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "This can take a minute. Rate-limited calls are retried automatically.",
            Style::default().fg(colors::DIM),
        )),
    ];
    frame.render_widget(Block::default().borders(Borders::ALL), area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_review(state: &AppState, session: &Session, frame: &mut Frame, area: Rect) {
    trace!("render_review: called");
    let Some(analysis) = session.project().analysis.as_ref() else {
        render_empty_message(frame, area, "No analysis");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_metrics(analysis, frame, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(chunks[1]);
    render_type_picker(state, analysis, frame, right[0]);
    render_budget_picker(state.budget, frame, right[1]);
}

fn render_metrics(analysis: &SiteAnalysis, frame: &mut Frame, area: Rect) {
    trace!("render_metrics: called");
    let mut lines = vec![
        metric_line("Sunlight", analysis.sunlight.label().to_string()),
        metric_line("Sealed ground", format!("{}%", analysis.soil_sealing_percent)),
        metric_line(
            "Biodiversity",
            format!(
                "{} {}/100",
                score_bar(analysis.biodiversity_score, 10),
                analysis.biodiversity_score
            ),
        ),
        metric_line("Hardiness zone", analysis.hardiness_zone.clone()),
        metric_line("Area", format!("~{:.0} m²", analysis.estimated_area_sqm)),
        Line::from(""),
        Line::from(analysis.summary.clone()),
    ];
    push_bullets(&mut lines, "Features", &analysis.features);
    push_bullets(&mut lines, "Deficits", &analysis.deficits);

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Site analysis "));
    frame.render_widget(para, area);
}

fn render_type_picker(state: &AppState, analysis: &SiteAnalysis, frame: &mut Frame, area: Rect) {
    trace!("render_type_picker: called");
    let choices = type_choices(analysis);
    let selected = state.type_selection.selected_index.min(choices.len().saturating_sub(1));

    let mut lines = Vec::new();
    for (i, choice) in choices.iter().enumerate() {
        let is_selected = i == selected;
        let base = if is_selected {
            Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let (score, color) = match choice.suitability {
            Some(s) => (s.score, score_color(s.score)),
            None => (0, colors::DIM),
        };
        lines.push(Line::from(vec![
            Span::styled(if is_selected { "▶ " } else { "  " }, base.fg(colors::HEADER)),
            Span::styled(format!("{:<18}", choice.restoration_type.label()), base),
            Span::styled(score_bar(score, 10), base.fg(color)),
            Span::styled(format!(" {:>3}", score), base.fg(color)),
        ]));
        if is_selected {
            let detail = choice
                .suitability
                .map(|s| s.rationale.as_str())
                .filter(|r| !r.is_empty())
                .unwrap_or(choice.restoration_type.description());
            lines.push(Line::from(Span::styled(
                format!("    {}", detail),
                Style::default().fg(colors::DIM),
            )));
        }
    }

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Restoration type "));
    frame.render_widget(para, area);
}

fn render_budget_picker(budget: BudgetTier, frame: &mut Frame, area: Rect) {
    trace!(%budget, "render_budget_picker: called");
    let mut spans = vec![Span::raw(" ")];
    for (i, tier) in [BudgetTier::Low, BudgetTier::Medium, BudgetTier::High].iter().enumerate() {
        let style = if *tier == budget {
            Style::default().fg(Color::Black).bg(colors::LEAF).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::DIM)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, tier.label()), style));
        spans.push(Span::raw("  "));
    }
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(format!(" {}", budget.guidance()), Style::default().fg(colors::DIM))),
    ];
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Budget "));
    frame.render_widget(para, area);
}

fn render_plan(state: &AppState, session: &Session, frame: &mut Frame, area: Rect) {
    trace!("render_plan: called");
    let project = session.project();
    let Some(plan) = project.plan.as_ref() else {
        render_empty_message(frame, area, "No plan");
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            plan.title.clone(),
            Style::default().fg(colors::LEAF).add_modifier(Modifier::BOLD),
        )),
        Line::from(plan.summary.clone()),
        Line::from(vec![
            Span::styled("Duration ", Style::default().fg(colors::DIM)),
            Span::raw(plan.total_duration.clone()),
            Span::styled("   Cost ", Style::default().fg(colors::DIM)),
            Span::raw(plan.money(plan.total_cost)),
        ]),
    ];
    if let Some(vision) = &project.restored_image {
        let saved = match &state.saved_to {
            Some(dir) => format!("saved to {}", dir.display()),
            None => "press s to save".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!("Vision: after.{} ({}), {}", vision.extension(), vision.size_label(), saved),
            Style::default().fg(colors::DIM),
        )));
    }
    lines.push(Line::from(""));

    let selected = state.phase_selection.selected_index;
    for (i, phase) in plan.phases.iter().enumerate() {
        let expanded = state.expanded_phases.contains(&i);
        let loading = state.loading_phases.contains(&i);
        lines.push(phase_header(plan, phase, i, i == selected, expanded, loading, state.spinner()));
        if expanded {
            push_phase_details(&mut lines, phase, state.search_results.get(&i));
        }
    }

    push_bullets(&mut lines, "Maintenance", &plan.maintenance);
    push_bullets(&mut lines, "Impact", &plan.impact);

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Plan "));
    frame.render_widget(para, area);
}

fn phase_header<'a>(
    plan: &RestorationPlan,
    phase: &'a PlanPhase,
    index: usize,
    selected: bool,
    expanded: bool,
    loading: bool,
    spinner: &'static str,
) -> Line<'a> {
    let base = if selected {
        Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let marker = if expanded { "▾" } else { "▸" };
    let mut spans = vec![
        Span::styled(format!("{} {}. ", marker, index + 1), base.fg(colors::HEADER)),
        Span::styled(phase.name.as_str(), base),
        Span::styled(
            format!("  {} · {}", phase.duration, plan.money(phase.cost)),
            base.fg(colors::DIM),
        ),
    ];
    if loading {
        spans.push(Span::styled(format!("  {} searching", spinner), base.fg(colors::WARN)));
    }
    Line::from(spans)
}

fn push_phase_details<'a>(lines: &mut Vec<Line<'a>>, phase: &'a PlanPhase, found: Option<&'a LocalSearchResult>) {
    for task in &phase.tasks {
        lines.push(Line::from(format!("     • {}", task)));
    }
    if !phase.materials.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("     Materials: {}", phase.materials.join(", ")),
            Style::default().fg(colors::DIM),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("     Hire: ", Style::default().fg(colors::DIM)),
        Span::raw(phase.service_category.as_str()),
    ]));

    match found {
        None => lines.push(Line::from(Span::styled(
            "     [f] find local services",
            Style::default().fg(colors::DIM),
        ))),
        Some(result) if result.is_empty() => lines.push(Line::from(Span::styled(
            "     No local providers found",
            Style::default().fg(colors::WARN),
        ))),
        Some(result) => {
            for p in &result.providers {
                let mut spans = vec![
                    Span::styled("     ◆ ", Style::default().fg(colors::LEAF)),
                    Span::styled(p.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                ];
                for extra in [&p.phone, &p.address] {
                    if !extra.is_empty() {
                        spans.push(Span::styled(format!("  {}", extra), Style::default().fg(colors::DIM)));
                    }
                }
                lines.push(Line::from(spans));
                if !p.description.is_empty() {
                    lines.push(Line::from(format!("       {}", p.description)));
                }
            }
            if !result.sources.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("     Sources: {}", result.sources.join(" ")),
                    Style::default().fg(colors::DIM),
                )));
            }
        }
    }
}

fn render_footer(state: &AppState, session: &Session, frame: &mut Frame, area: Rect) {
    trace!(mode = ?state.interaction_mode, "render_footer: called");
    let content = if let InteractionMode::PathInput(text) = &state.interaction_mode {
        Line::from(vec![
            Span::styled("Image path: ", Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD)),
            Span::raw(text.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled("  (Enter to open, Esc to cancel)", Style::default().fg(colors::DIM)),
        ])
    } else if let Some(error) = &state.error_message {
        Line::from(Span::styled(format!(" Error: {}", error), Style::default().fg(colors::ERROR)))
    } else if let Some(notice) = session.notice() {
        let color = match notice.level {
            NoticeLevel::Info => colors::LEAF,
            NoticeLevel::Warning => colors::WARN,
            NoticeLevel::Error => colors::ERROR,
        };
        Line::from(Span::styled(format!(" {}", notice.message), Style::default().fg(color)))
    } else {
        let keybinds: &[(&str, &str)] = match session.state() {
            FlowState::Idle => &[("[o]", "Open"), ("[d]", "Demo"), ("[g]", "Locate")],
            FlowState::Analyzing | FlowState::GeneratingVision => &[("[r]", "Start over")],
            FlowState::ReviewAnalysis => &[
                ("[j/k]", "Type"),
                ("[1-3/Tab]", "Budget"),
                ("[Enter]", "Generate"),
                ("[r]", "Start over"),
            ],
            FlowState::Complete => &[
                ("[j/k]", "Phase"),
                ("[Enter]", "Expand"),
                ("[f]", "Find services"),
                ("[s]", "Save"),
                ("[r]", "Start over"),
            ],
        };
        let mut spans = vec![Span::raw(" ")];
        for (key, action) in keybinds.iter().chain([("[?]", "Help"), ("[q]", "Quit")].iter()) {
            spans.push(Span::styled(
                *key,
                Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {} ", action)));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(content).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )),
        Line::from(""),
        Line::from(Span::styled("Global", bold)),
        key_line("g", "Share location"),
        key_line("r", "Start over"),
        key_line("?", "Toggle help"),
        key_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("Upload", bold)),
        key_line("o", "Open an image file (png, jpg, webp, heic)"),
        key_line("d", "Use the demo photo"),
        Line::from(""),
        Line::from(Span::styled("Review", bold)),
        key_line("j/↓ k/↑", "Choose restoration type"),
        key_line("1 2 3 / Tab", "Choose budget tier"),
        key_line("Enter", "Generate vision and plan"),
        Line::from(""),
        Line::from(Span::styled("Plan", bold)),
        key_line("j/↓ k/↑", "Select phase"),
        key_line("Enter", "Expand or collapse phase"),
        key_line("f", "Find local services for the phase"),
        key_line("s", "Save image and plan"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (? to close) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, popup_area);
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<14}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

fn metric_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<16}", label), Style::default().fg(colors::DIM)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

fn push_bullets(lines: &mut Vec<Line<'_>>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        heading.to_string(),
        Style::default().fg(colors::HEADER),
    )));
    for item in items {
        lines.push(Line::from(format!("  • {}", item)));
    }
}

/// Render confirmation dialog
fn render_confirm_dialog(dialog: &ConfirmDialog, frame: &mut Frame, area: Rect) {
    trace!("render_confirm_dialog: called");
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let yes_style = if dialog.selected_button {
        Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let no_style = if !dialog.selected_button {
        Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red)
    };

    let content = vec![
        Line::from(""),
        Line::from(dialog.message.as_str()),
        Line::from(""),
        Line::from(vec![
            Span::styled(" No ", no_style),
            Span::raw("    "),
            Span::styled(" Yes ", yes_style),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab: switch  Enter: confirm  y/n  Esc: cancel",
            Style::default().fg(colors::DIM),
        )),
    ];

    let widget = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm ")
                .style(Style::default().bg(Color::Black)),
        )
        .alignment(Alignment::Center);
    frame.render_widget(widget, popup_area);
}

fn render_empty_message(frame: &mut Frame, area: Rect, message: &str) {
    let empty = Paragraph::new(message)
        .style(Style::default().fg(colors::DIM))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(empty, area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Fixed-width bar for a 0-100 score, e.g. "██████░░░░"
fn score_bar(score: u32, width: usize) -> String {
    let filled = ((score.min(100) as usize * width) + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn score_color(score: u32) -> Color {
    match score {
        70.. => colors::DONE,
        40..=69 => colors::WARN,
        _ => colors::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RestorationType, ServiceProvider, SiteImage, fixtures};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(state: &AppState, session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(state, session, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(score_bar(100, 10), "██████████");
        assert_eq!(score_bar(88, 10), "█████████░");
        assert_eq!(score_bar(250, 4), "████");
    }

    #[test]
    fn test_render_each_state() {
        let state = AppState::new();
        let mut session = Session::new();
        assert!(draw(&state, &session).contains("Open a photo from disk"));

        let image = SiteImage::from_bytes("image/png", vec![1]).unwrap();
        let job = session.begin_analysis(image.clone()).unwrap();
        assert!(draw(&state, &session).contains("Analyzing your site"));

        session.complete_analysis::<String>(job.ticket, Ok(fixtures::analysis()));
        let screen = draw(&state, &session);
        assert!(screen.contains("Pollinator Haven"));
        assert!(screen.contains("Hardiness zone"));

        let job = session.begin_generation(RestorationType::PollinatorHaven, BudgetTier::Low).unwrap();
        session.complete_generation::<String>(job.ticket, Ok((image, fixtures::plan())));
        let screen = draw(&state, &session);
        assert!(screen.contains("Parking Lot Pollinator Haven"));
        assert!(screen.contains("Depaving"));
    }

    fn complete_session() -> Session {
        let mut session = Session::new();
        let image = SiteImage::from_bytes("image/png", vec![1]).unwrap();
        let job = session.begin_analysis(image.clone()).unwrap();
        session.complete_analysis::<String>(job.ticket, Ok(fixtures::analysis()));
        let job = session.begin_generation(RestorationType::PollinatorHaven, BudgetTier::Low).unwrap();
        session.complete_generation::<String>(job.ticket, Ok((image, fixtures::plan())));
        session
    }

    #[test]
    fn test_render_expanded_phase_with_providers() {
        let session = complete_session();
        let mut state = AppState::new();
        state.expanded_phases.insert(0);

        let screen = draw(&state, &session);
        assert!(screen.contains("Hire: asphalt removal contractor"));
        assert!(screen.contains("[f] find local services"));

        state.search_results.insert(
            0,
            LocalSearchResult {
                phase_index: 0,
                category: "asphalt removal contractor".to_string(),
                providers: vec![ServiceProvider {
                    name: "Depave Co".to_string(),
                    description: "Lot conversions".to_string(),
                    phone: "555 0100".to_string(),
                    address: String::new(),
                }],
                sources: vec!["https://depave.example".to_string()],
            },
        );
        let screen = draw(&state, &session);
        assert!(screen.contains("◆ Depave Co"));
        assert!(screen.contains("555 0100"));
        assert!(screen.contains("Lot conversions"));
        assert!(screen.contains("Sources: https://depave.example"));
        assert!(!screen.contains("[f] find local services"));

        state.search_results.insert(0, LocalSearchResult::empty(0, "asphalt removal contractor"));
        assert!(draw(&state, &session).contains("No local providers found"));
    }
}
