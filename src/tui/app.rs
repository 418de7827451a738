//! Main TUI application state.
//!
//! Handles:
//! - Input event handling
//! - Form submission through the predictor gateway
//! - Terminal setup and teardown

use std::io;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::PredictorGateway;
use crate::ports::ArtifactLoader;

use super::ui::{
    form::{render_patient_form, PatientFormState},
    render_disclaimer, render_header,
    result::{render_result, ResultState},
};

/// Main application state
pub struct App<L>
where
    L: ArtifactLoader,
{
    gateway: Arc<PredictorGateway<L>>,
    form: PatientFormState,
    result: ResultState,
    should_quit: bool,
}

impl<L> App<L>
where
    L: ArtifactLoader,
{
    /// Create the application around an already-built gateway.
    pub fn new(gateway: Arc<PredictorGateway<L>>) -> Self {
        Self {
            gateway,
            form: PatientFormState::default(),
            result: ResultState::default(),
            should_quit: false,
        }
    }

    /// Run the main application loop.
    ///
    /// While the alternate screen is up, panic messages go to the log
    /// instead of stderr, and the terminal is restored even if the loop
    /// unwinds.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        let result = {
            let _screen = ScreenGuard::enter()?;
            let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
            with_panics_logged(|| self.main_loop(&mut terminal))
        };

        // Wipe typed values before exit.
        self.form.reset();

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(2), // Header
                        Constraint::Min(0),    // Body
                        Constraint::Length(2), // Disclaimer
                    ])
                    .split(f.area());

                let body = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .split(chunks[1]);

                render_header(f, chunks[0]);
                render_patient_form(f, body[0], &self.form);
                render_result(f, body[1], &self.result);
                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('q') | KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.form.reset();
                    self.result = ResultState::Idle;
                }
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form.next_field(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => self.form.toggle(),
            KeyCode::Char(c) => self.form.input_char(c),
            KeyCode::Backspace => self.form.delete_char(),
            KeyCode::Delete => self.form.clear_field(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    /// One "Predict Risk" press: errors end up on screen, never as a crash.
    fn submit(&mut self) {
        let input = match self.form.to_patient_input() {
            Ok(input) => input,
            Err(message) => {
                self.form.error_message = Some(message);
                return;
            }
        };
        self.form.error_message = None;

        self.result = match self.gateway.predict_input(&input) {
            Ok(result) => {
                tracing::info!(
                    label = %result.label,
                    probability = %result.probability_percent(),
                    "Prediction shown"
                );
                ResultState::Complete { result }
            }
            Err(e) => {
                tracing::warn!("Prediction failed: {e}");
                ResultState::Error {
                    message: e.to_string(),
                }
            }
        };
    }
}

/// Raw mode plus alternate screen, undone on drop.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        Ok(Self)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, Show);
    }
}

/// Run `f` with a panic hook that logs instead of printing.
///
/// Classifier panics are caught by the gateway, but the default hook would
/// still write to the terminal behind the TUI.
fn with_panics_logged<R>(f: impl FnOnce() -> R) -> R {
    struct RestoreHook(Option<Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>>);

    impl Drop for RestoreHook {
        fn drop(&mut self) {
            // set_hook may not be called while unwinding.
            if !std::thread::panicking() {
                if let Some(hook) = self.0.take() {
                    panic::set_hook(hook);
                }
            }
        }
    }

    let _restore = RestoreHook(Some(panic::take_hook()));
    panic::set_hook(Box::new(|info: &PanicHookInfo<'_>| {
        tracing::error!("panic: {info}");
    }));

    f()
}
