use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn keybind(keys: &'static str, pad: usize, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(label),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, api_base: &str, log_path: Option<&str>) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        keybind("r", 11, "Refresh sources and latest job"),
        keybind("s", 11, "Start ingestion for selected source"),
        keybind("n", 11, "Edit the create-source form"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Select source"),
        ]),
        keybind("e", 11, "Export snapshot as JSON"),
        keybind("tab", 9, "Switch tabs"),
        keybind("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Create-source form:"),
        keybind("tab", 9, "Switch between name and CSV path"),
        keybind("enter", 7, "Create source"),
        keybind("esc", 9, "Stop editing"),
        Line::from(""),
        Line::from("Actions are disabled while a request is in flight."),
        Line::from(""),
        Line::from("Connection:"),
        Line::from(vec![
            Span::raw("  API: "),
            Span::styled(api_base.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ];
    if let Some(path) = log_path {
        lines.push(Line::from(vec![
            Span::raw("  Log: "),
            Span::styled(path.to_string(), Style::default().fg(Color::Cyan)),
        ]));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
