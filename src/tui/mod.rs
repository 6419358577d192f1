//! Ratatui-based terminal UI.
//!
//! The pipeline runs on a worker thread and streams rows over a channel; the
//! UI thread renders a progress gauge and the growing result table. `q`/`Esc`
//! trips the cancel token, which the worker honours before its next call.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};

use crate::app::pipeline::{RunOutput, run_pipeline};
use crate::domain::{AddressRecord, Confidence, ReportedRow};
use crate::error::AppError;
use crate::geocode::Geocoder;
use crate::report::ResultSink;
use crate::throttle::CancelToken;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Messages from the worker's sink to the UI thread.
#[derive(Debug, Clone)]
enum PipelineEvent {
    Loading(bool),
    Row(ReportedRow),
}

struct ChannelSink {
    tx: Sender<PipelineEvent>,
}

impl ResultSink for ChannelSink {
    fn append_row(&mut self, row: &ReportedRow) {
        // The UI may already be gone; the run still completes.
        let _ = self.tx.send(PipelineEvent::Row(row.clone()));
    }

    fn set_loading(&mut self, visible: bool) {
        let _ = self.tx.send(PipelineEvent::Loading(visible));
    }
}

/// Run the pipeline behind the interactive view and return its output once the
/// worker has finished.
pub fn run<G>(
    title: String,
    addresses: Vec<AddressRecord>,
    geocoder: G,
    delay: Duration,
) -> Result<RunOutput, AppError>
where
    G: Geocoder + Send + 'static,
{
    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();

    let mut view = App::new(title, addresses.len(), cancel.clone());
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        let mut sink = ChannelSink { tx };
        run_pipeline(&addresses, &geocoder, &mut sink, delay, &worker_cancel)
    });

    let ui_result = {
        match TerminalGuard::new() {
            Ok(_guard) => match Terminal::new(CrosstermBackend::new(io::stdout())) {
                Ok(mut terminal) => view.event_loop(&mut terminal, &rx),
                Err(e) => Err(AppError::runtime(format!("Failed to initialize terminal: {e}"))),
            },
            Err(e) => Err(e),
        }
    };

    // Whatever happened to the UI, never leave the worker running.
    if ui_result.is_err() {
        cancel.cancel();
    }
    let output = worker
        .join()
        .map_err(|_| AppError::runtime("Geocoding worker panicked."))?;

    ui_result.map(|()| output)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    title: String,
    total: usize,
    rows: Vec<ReportedRow>,
    loading: bool,
    finished: bool,
    cancel: CancelToken,
    status: String,
    tick: usize,
}

impl App {
    fn new(title: String, total: usize, cancel: CancelToken) -> Self {
        Self {
            title,
            total,
            rows: Vec::new(),
            loading: false,
            finished: false,
            cancel,
            status: "Starting...".to_string(),
            tick: 0,
        }
    }

    fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &Receiver<PipelineEvent>,
    ) -> Result<(), AppError> {
        loop {
            self.drain(rx);
            if self.finished && self.cancel.is_cancelled() {
                break;
            }

            terminal
                .draw(|f| self.draw(f))
                .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
            self.tick = self.tick.wrapping_add(1);

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            if let Event::Key(key) =
                event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))?
            {
                if key.kind == KeyEventKind::Press && self.handle_key(key.code) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self, rx: &Receiver<PipelineEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finish();
                    break;
                }
            }
        }
    }

    fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Loading(true) => {
                self.loading = true;
                self.status = "Geocoding... q/Esc to stop".to_string();
            }
            PipelineEvent::Loading(false) => self.finish(),
            PipelineEvent::Row(row) => self.rows.push(row),
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.loading = false;
        self.finished = true;
        self.status = if self.cancel.is_cancelled() {
            "Stopped. q/Esc to exit".to_string()
        } else {
            "Done. q/Esc to exit".to_string()
        };
    }

    /// Returns `true` when the UI should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.finished {
                    return true;
                }
                if !self.cancel.is_cancelled() {
                    log::info!("Stop requested from the terminal view");
                    self.cancel.cancel();
                    self.status = "Stopping after the current call...".to_string();
                }
                false
            }
            _ => false,
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_progress(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_progress(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let done = self.rows.len();
        let ratio = if self.total == 0 {
            1.0
        } else {
            (done as f64 / self.total as f64).clamp(0.0, 1.0)
        };
        let spinner = if self.loading {
            SPINNER[self.tick % SPINNER.len()]
        } else {
            " "
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(format!(" geobatch {spinner} {} ", self.title))
                    .borders(Borders::ALL),
            )
            .gauge_style(Style::default().fg(Color::Cyan))
            .label(format!("{done}/{}", self.total))
            .ratio(ratio);
        frame.render_widget(gauge, area);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        // Borders plus the header row.
        let visible = area.height.saturating_sub(3) as usize;
        let skip = self.rows.len().saturating_sub(visible);

        let header = Row::new(["#", "address", "exact", "precise", "status", "confidence"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.rows.iter().skip(skip).map(|row| {
            let r = &row.result;
            let confidence = r.confidence();
            Row::new(vec![
                Cell::from(row.index.to_string()),
                Cell::from(r.address.clone()),
                Cell::from(r.is_exact_match().to_string()),
                Cell::from(r.is_precise_location().to_string()),
                Cell::from(r.status.clone()),
                Cell::from(confidence.label()),
            ])
            .style(Style::default().fg(confidence_color(confidence)))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(20),
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Length(18),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(Block::default().title("Results").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled(&self.status, Style::default().fg(Color::Gray)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::High => Color::Green,
        Confidence::Partial => Color::Yellow,
        Confidence::Unconfirmed => Color::White,
        Confidence::Failed => Color::Red,
    }
}
