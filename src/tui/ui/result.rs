//! Prediction result panel.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{PredictionResult, RiskLabel};
use crate::tui::styles::MedicalTheme;

/// Result panel state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// No prediction requested yet
    #[default]
    Idle,
    /// Last prediction succeeded
    Complete { result: PredictionResult },
    /// Last prediction failed; the form stays usable
    Error { message: String },
}

/// Render the result panel
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    match state {
        ResultState::Idle => render_idle(f, area),
        ResultState::Complete { result } => render_prediction(f, area, result),
        ResultState::Error { message } => render_error(f, area, message),
    }
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Enter patient details",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to predict",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_prediction(f: &mut Frame, area: Rect, result: &PredictionResult) {
    let block = Block::default()
        .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Label
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Timestamp
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let style = MedicalTheme::risk_label(result.label);
    let icon = match result.label {
        RiskLabel::HighRisk => "!",
        RiskLabel::LowRisk => "OK",
    };

    let label = Paragraph::new(Line::from(Span::styled(
        format!("{icon} {}", result.label.description()),
        style.add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(label, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Risk Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(style)
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(result.probability_percent());
    f.render_widget(gauge, chunks[1]);

    let when = Paragraph::new(Line::from(Span::styled(
        format!(
            "Evaluated {}",
            result
                .evaluated_at
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
        ),
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(when, chunks[2]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
