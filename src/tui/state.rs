use crate::model::{JobStatus, SubmissionState};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::time::Instant;

#[derive(Default)]
pub struct UiState {
    pub tab: usize,
    pub info: String,
    /// Text being edited; kept after submitting, like a form field.
    pub input: String,
    pub submission: SubmissionState,
    pub submitted_at_utc: Option<String>,
    pub submitted_at: Option<Instant>,
    pub last_exported_path: Option<String>,
}

impl UiState {
    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Text to submit, or None when the input is blank.
    pub fn submission_text(&self) -> Option<String> {
        crate::cli::validate_text(self.input.clone()).ok()
    }

    pub fn mark_submitted(&mut self, now_utc: String) {
        self.submitted_at_utc = Some(now_utc);
        self.submitted_at = Some(Instant::now());
        self.last_exported_path = None;
    }

    pub fn is_busy(&self) -> bool {
        self.submission.status.is_in_flight()
    }

    pub fn submit_hint(&self) -> &'static str {
        if self.is_busy() {
            "Analyzing… (Enter resubmits)"
        } else {
            "Enter: submit for analysis"
        }
    }

    /// Replace the snapshot; returns true when this update settled the job.
    pub fn apply_snapshot(&mut self, next: SubmissionState) -> bool {
        let was_busy = self.is_busy();
        self.submission = next;
        was_busy && self.submission.status.is_terminal()
    }
}

pub fn status_color(status: JobStatus) -> Color {
    match status {
        JobStatus::Idle => Color::Gray,
        JobStatus::Pending | JobStatus::Processing => Color::Yellow,
        JobStatus::Completed => Color::Green,
        JobStatus::Error => Color::Red,
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

/// Lines for the status box under the input form.
pub fn status_lines(state: &UiState, width: u16) -> Vec<Line<'static>> {
    let s = &state.submission;
    let mut out = Vec::new();

    if s.status == JobStatus::Idle {
        out.push(Line::from(Span::styled(
            "Type some text and press Enter to analyze it.",
            Style::default().fg(Color::Gray),
        )));
        return out;
    }

    out.push(Line::from(vec![
        Span::styled("Status:", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            s.status.as_str().to_string(),
            Style::default().fg(status_color(s.status)),
        ),
    ]));
    if let Some(job_id) = s.job_id.as_deref() {
        push_wrapped_status_kv(&mut out, "Job ID", job_id, width);
    }
    if let Some(t0) = state.submitted_at {
        if s.status.is_in_flight() {
            push_wrapped_status_kv(
                &mut out,
                "Elapsed",
                &format!("{:.0}s", t0.elapsed().as_secs_f64()),
                width,
            );
        }
    }

    match s.status {
        JobStatus::Error => {
            if let Some(msg) = s.error_message() {
                out.push(Line::from(Span::styled(msg, Style::default().fg(Color::Red))));
            }
        }
        JobStatus::Completed => {
            if let Some(results) = s.results.as_ref() {
                out.push(Line::from(""));
                push_wrapped_status_kv(
                    &mut out,
                    "Sentiment",
                    results.sentiment.as_deref().unwrap_or("-"),
                    width,
                );
                let keywords = if results.keywords.is_empty() {
                    "-".to_string()
                } else {
                    results.keywords.join(", ")
                };
                push_wrapped_status_kv(&mut out, "Keywords", &keywords, width);
            }
        }
        _ => {}
    }

    if let Some(path) = state.last_exported_path.as_deref() {
        push_wrapped_status_kv(&mut out, "Exported", path, width);
    }
    out
}
