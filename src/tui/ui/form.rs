//! Patient data input form.
//!
//! Mirrors bounded form widgets: binary fields are toggles, numeric fields
//! accept digits and are clamped to their min/max on submit.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{FieldKind, FieldSpec, PatientInput, FEATURE_COUNT, FIELD_SPECS};
use crate::tui::styles::MedicalTheme;

/// Form field with its current text
#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: &'static FieldSpec,
    pub value: String,
}

impl FormField {
    fn with_default(spec: &'static FieldSpec) -> Self {
        Self {
            spec,
            value: format_value(spec, spec.default),
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self {
            fields: FIELD_SPECS.iter().map(FormField::with_default).collect(),
            selected_field: 0,
            error_message: None,
        }
    }
}

fn format_value(spec: &FieldSpec, value: f64) -> String {
    match spec.kind {
        FieldKind::Binary | FieldKind::Integer => format!("{value:.0}"),
        FieldKind::Decimal if value.fract() == 0.0 => format!("{value:.1}"),
        FieldKind::Decimal => value.to_string(),
    }
}

impl PatientFormState {
    fn current(&mut self) -> &mut FormField {
        &mut self.fields[self.selected_field]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = self.current();
        match field.spec.kind {
            FieldKind::Binary if c == '0' || c == '1' => {
                field.value = c.to_string();
            }
            FieldKind::Integer if c.is_ascii_digit() => field.value.push(c),
            FieldKind::Decimal if c.is_ascii_digit() || (c == '.' && !field.value.contains('.')) => {
                field.value.push(c);
            }
            _ => return,
        }
        self.error_message = None;
    }

    /// Flip a binary field between 0 and 1
    pub fn toggle(&mut self) {
        let field = self.current();
        if field.spec.kind == FieldKind::Binary {
            field.value = if field.value == "1" { "0" } else { "1" }.to_string();
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.current().value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.current().value.clear();
    }

    /// Wipe all field buffers and restore the defaults.
    pub fn reset(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        *self = Self::default();
    }

    /// Clamp every filled field to its widget bounds and convert.
    ///
    /// Empty fields become `None` and are left to the gateway's missing
    /// value policy. Clamped values are written back so the form shows
    /// what was actually submitted.
    pub fn to_patient_input(&mut self) -> Result<PatientInput, String> {
        let mut values = [None; FEATURE_COUNT];

        for (slot, field) in values.iter_mut().zip(self.fields.iter_mut()) {
            let text = field.value.trim();
            if text.is_empty() {
                continue;
            }

            let parsed: f64 = text
                .parse()
                .map_err(|_| format!("{}: Invalid number", field.spec.label))?;
            let clamped = field.spec.clamp(parsed);
            // Rewrite in place so the typed text is wiped, not just dropped.
            let shown = format_value(field.spec, clamped);
            field.value.zeroize();
            field.value.push_str(&shown);
            *slot = Some(clamped);
        }

        Ok(PatientInput::from_options(values))
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Form
            Constraint::Length(2), // Error / hints
        ])
        .split(area);

    render_form_fields(f, chunks[0], state);
    render_form_footer(f, chunks[1], state);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mid = state.fields.len().div_ceil(2);

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.spec.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if field.value.is_empty() {
            spans.push(Span::styled("(missing)", MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.as_str(), MedicalTheme::text()));
        }
        if is_selected {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }
        spans.push(Span::styled(
            format!("  {}", field.spec.hint),
            MedicalTheme::text_muted(),
        ));

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.as_str(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[Space] ", MedicalTheme::key_hint()),
            Span::styled("Toggle ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict Risk ", MedicalTheme::key_desc()),
            Span::styled("[Ctrl+R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
