//! Terminal user interface for the recording session.
//!
//! Renders the current phase (ready prompt, countdown digits, recording
//! clock, review form, upload progress) and turns keystrokes into session
//! intents. The view never mutates session state directly; everything it
//! wants goes through the event queue, and the controller decides.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    prelude::*,
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::session::{Phase, SessionEvent};

/// What a keystroke (or its absence) means for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderCommand {
    /// Nothing actionable; keep rendering.
    Continue,
    /// Dispatch this intent into the session queue.
    Intent(SessionEvent),
    /// Leave the recorder.
    Quit,
}

/// Terminal UI for the recording workflow.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title_input: Input,
}

impl RecorderTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(RecorderTui {
            terminal,
            title_input: Input::default(),
        })
    }

    /// Polls for one keystroke and maps it to a command for the current
    /// phase. Keys that make no sense in the phase are ignored; the
    /// controller double-checks anyway.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, phase: &Phase) -> anyhow::Result<RecorderCommand> {
        if !event::poll(std::time::Duration::from_millis(50))? {
            return Ok(RecorderCommand::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(RecorderCommand::Continue);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(RecorderCommand::Continue);
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            tracing::debug!("Ctrl+C pressed: leaving recorder");
            return Ok(RecorderCommand::Quit);
        }

        let command = match phase {
            Phase::Ready => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => {
                    RecorderCommand::Intent(SessionEvent::Start)
                }
                KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
                _ => RecorderCommand::Continue,
            },
            Phase::Countdown { .. } | Phase::Uploading { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
                _ => RecorderCommand::Continue,
            },
            Phase::Recording { .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => {
                    RecorderCommand::Intent(SessionEvent::Stop)
                }
                KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
                _ => RecorderCommand::Continue,
            },
            Phase::Review { .. } => match key.code {
                KeyCode::Enter => RecorderCommand::Intent(SessionEvent::Upload),
                KeyCode::Esc => {
                    self.title_input.reset();
                    RecorderCommand::Intent(SessionEvent::Discard)
                }
                _ => {
                    // Everything else edits the title field.
                    if self
                        .title_input
                        .handle_event(&Event::Key(key))
                        .is_some()
                    {
                        RecorderCommand::Intent(SessionEvent::SetTitle(
                            self.title_input.value().to_string(),
                        ))
                    } else {
                        RecorderCommand::Continue
                    }
                }
            },
        };
        Ok(command)
    }

    /// Renders one frame for the current phase.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(
        &mut self,
        phase: &Phase,
        device_live: bool,
        status: Option<&str>,
        library_count: Option<usize>,
    ) -> anyhow::Result<()> {
        // The edit buffer belongs to review; a fresh take starts blank.
        if matches!(
            phase,
            Phase::Ready | Phase::Countdown { .. } | Phase::Recording { .. }
        ) && !self.title_input.value().is_empty()
        {
            self.title_input.reset();
        }

        let title_value = self.title_input.value().to_string();
        let title_cursor = self.title_input.visual_cursor();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(area);

            draw_header(frame, rows[0], phase);
            match phase {
                Phase::Ready => draw_ready(frame, rows[1], device_live),
                Phase::Countdown { remaining } => draw_countdown(frame, rows[1], *remaining),
                Phase::Recording { elapsed } => draw_recording(frame, rows[1], *elapsed),
                Phase::Review { artifact, .. } => {
                    draw_review(frame, rows[1], artifact.len(), &title_value, title_cursor)
                }
                Phase::Uploading { title, .. } => draw_uploading(frame, rows[1], title),
            }
            draw_footer(frame, rows[2], phase, status, library_count);
        })?;

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn draw_header(frame: &mut Frame, area: Rect, phase: &Phase) {
    let header = Line::from(vec![
        Span::styled(
            " camcord ",
            Style::default().bg(Color::Rgb(185, 207, 212)).fg(Color::Black),
        ),
        Span::raw(" "),
        Span::styled(phase.name(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn centered(frame: &mut Frame, area: Rect, lines: Vec<Line>) {
    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let target = Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: height.min(area.height),
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        target,
    );
}

fn draw_ready(frame: &mut Frame, area: Rect, device_live: bool) {
    let device_line = if device_live {
        Line::from(Span::styled(
            "camera and microphone ready",
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            "no device stream - press Enter to retry",
            Style::default().fg(Color::Yellow),
        ))
    };
    centered(
        frame,
        area,
        vec![
            Line::from("Press Enter to start recording"),
            Line::from(""),
            device_line,
        ],
    );
}

fn draw_countdown(frame: &mut Frame, area: Rect, remaining: u32) {
    centered(
        frame,
        area,
        vec![
            Line::from("Recording in"),
            Line::from(""),
            Line::from(Span::styled(
                remaining.to_string(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
        ],
    );
}

fn draw_recording(frame: &mut Frame, area: Rect, elapsed: u64) {
    let minutes = elapsed / 60;
    let seconds = elapsed % 60;
    centered(
        frame,
        area,
        vec![
            Line::from(Span::styled("● REC", Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(format!("{minutes}:{seconds:02}")),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to stop",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    );
}

fn draw_review(frame: &mut Frame, area: Rect, artifact_bytes: usize, title: &str, cursor: usize) {
    let kib = artifact_bytes / 1024;
    // Cursor position is in characters, so split accordingly.
    let mut chars = title.chars();
    let before: String = chars.by_ref().take(cursor).collect();
    let after: String = chars.collect();
    let title_line = Line::from(vec![
        Span::raw("Title: "),
        Span::styled(before, Style::default().add_modifier(Modifier::UNDERLINED)),
        Span::styled("▏", Style::default().fg(Color::Yellow)),
        Span::styled(after, Style::default().add_modifier(Modifier::UNDERLINED)),
    ]);
    centered(
        frame,
        area,
        vec![
            Line::from(format!("Take captured ({kib} KiB)")),
            Line::from(""),
            title_line,
            Line::from(""),
            Line::from(Span::styled(
                "Enter to upload · Esc to discard",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    );
}

fn draw_uploading(frame: &mut Frame, area: Rect, title: &str) {
    centered(
        frame,
        area,
        vec![
            Line::from(Span::styled(
                "Uploading…",
                Style::default().fg(Color::Cyan),
            )),
            Line::from(""),
            Line::from(title.to_string()),
        ],
    );
}

fn draw_footer(
    frame: &mut Frame,
    area: Rect,
    phase: &Phase,
    status: Option<&str>,
    library_count: Option<usize>,
) {
    let left = match status {
        Some(message) => Span::styled(message.to_string(), Style::default().fg(Color::Red)),
        None => match phase {
            Phase::Ready => Span::raw("Enter start · q quit"),
            Phase::Countdown { .. } => Span::raw("get ready…"),
            Phase::Recording { .. } => Span::raw("Enter stop"),
            Phase::Review { .. } => Span::raw("type a title, Enter to upload"),
            Phase::Uploading { .. } => Span::raw("uploading…"),
        },
    };

    let right = match library_count {
        Some(count) => format!("library: {count} recordings"),
        None => String::new(),
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(right.len() as u16)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(left)).style(Style::default().fg(Color::Rgb(185, 207, 212))),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(right).style(Style::default().fg(Color::DarkGray)),
        columns[1],
    );
}
