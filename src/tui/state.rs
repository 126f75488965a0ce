use crate::cli::ConsoleConfig;
use crate::model::SourceId;
use crate::orchestrator::ConsoleEvent;
use crate::session::SessionState;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    CsvPath,
}

/// Create-source form inputs. Free text; nothing is validated locally.
#[derive(Debug, Clone)]
pub struct CreateForm {
    pub name: String,
    pub csv_path: String,
    pub field: FormField,
    pub editing: bool,
}

impl CreateForm {
    pub fn active_input(&mut self) -> &mut String {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::CsvPath => &mut self.csv_path,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            FormField::Name => FormField::CsvPath,
            FormField::CsvPath => FormField::Name,
        };
    }
}

/// UI-thread state. `session` is the last snapshot published by the controller.
pub struct UiState {
    pub tab: usize,
    pub api_base: String,
    pub session: SessionState,
    // Transient feedback from the UI or controller (rejections, exports); cleared on next key.
    pub notice: Option<String>,
    pub form: CreateForm,
    pub log_path: Option<String>,
}

impl UiState {
    pub fn new(cfg: &ConsoleConfig) -> Self {
        Self {
            tab: 0,
            api_base: cfg.base_url.clone(),
            session: SessionState::default(),
            notice: None,
            form: CreateForm {
                name: cfg.form_name.clone(),
                csv_path: cfg.form_csv_path.clone(),
                field: FormField::Name,
                editing: false,
            },
            log_path: None,
        }
    }

    pub fn apply_event(&mut self, ev: ConsoleEvent) {
        match ev {
            ConsoleEvent::State(snapshot) => self.session = *snapshot,
            ConsoleEvent::Notice(text) => self.notice = Some(text),
        }
    }

    /// Source id `step` positions away from the current selection, clamped to the list.
    /// A stale or unset selection moves to the first source.
    pub fn neighbour_source(&self, step: isize) -> Option<SourceId> {
        let sources = &self.session.sources;
        if sources.is_empty() {
            return None;
        }
        let current = self
            .session
            .selected_source_id
            .and_then(|id| sources.iter().position(|s| s.id == id));
        let idx = match current {
            Some(i) => i.saturating_add_signed(step).min(sources.len() - 1),
            None => 0,
        };
        Some(sources[idx].id)
    }
}

pub fn job_status_color(status: &crate::model::JobStatus) -> Color {
    use crate::model::JobStatus;
    if status.is(JobStatus::SUCCEEDED) {
        Color::Green
    } else if status.is(JobStatus::FAILED) {
        Color::Red
    } else if status.is(JobStatus::RUNNING) {
        Color::Yellow
    } else if status.is(JobStatus::QUEUED) {
        Color::Blue
    } else {
        Color::Gray
    }
}

pub fn source_status_color(status: &crate::model::SourceStatus) -> Color {
    if status.is(crate::model::SourceStatus::ACTIVE) {
        Color::Green
    } else {
        Color::Gray
    }
}

pub fn severity_color(severity: &crate::model::Severity) -> Color {
    use crate::model::Severity;
    if severity.is(Severity::ERROR) {
        Color::Red
    } else if severity.is(Severity::WARNING) {
        Color::Yellow
    } else {
        Color::Gray
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
