use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        keybind("Enter", 9, "Submit text (a new submission replaces the running one)"),
        keybind("Backspace", 5, "Delete last character"),
        keybind("Ctrl-U", 8, "Clear the input"),
        keybind("Ctrl-Y", 8, "Copy job ID to clipboard"),
        keybind("Ctrl-S", 8, "Save report as JSON"),
        keybind("Tab", 11, "Switch tabs"),
        Line::from(""),
        Line::from("Status:"),
        Line::from("  PENDING / PROCESSING  the service is still working; checked every poll interval"),
        Line::from("  COMPLETED             sentiment and keywords are shown"),
        Line::from("  ERROR                 the submission or the job failed; submit again to retry"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
