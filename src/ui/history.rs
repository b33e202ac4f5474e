use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::App;

pub fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let board = app.engine.scoreboard();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // summary
            Constraint::Min(0),    // table
            Constraint::Length(1), // keys
        ])
        .split(area);

    let summary = match board.summary() {
        Some(s) => format!(
            "{} sessions   best {} wpm   avg {:.1} wpm   range {}-{}   avg acc {:.1}%",
            s.sessions,
            board.best_wpm().unwrap_or(s.max_wpm),
            s.average_wpm,
            s.min_wpm,
            s.max_wpm,
            s.average_accuracy
        ),
        None => "No finished sessions yet".to_string(),
    };
    Paragraph::new(summary)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("History (last {})", board.limit())),
        )
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    // header and borders take three rows
    let table_height = chunks[1].height.saturating_sub(3) as usize;
    let total_rows = board.history().len();
    let offset = app
        .history_scroll
        .min(total_rows.saturating_sub(table_height));

    let best = board.best_wpm();
    let rows: Vec<Row> = board
        .history()
        .iter()
        .rev()
        .skip(offset)
        .take(table_height)
        .map(|record| {
            let wpm_style = if Some(record.wpm) == best {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let acc_color = match record.accuracy {
                95.. => Color::Green,
                85..=94 => Color::Yellow,
                _ => Color::Red,
            };

            Row::new(vec![
                Cell::from(record.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(record.wpm.to_string()).style(wpm_style),
                Cell::from(format!("{}%", record.accuracy)).style(Style::default().fg(acc_color)),
                Cell::from(record.mistakes.to_string()),
                Cell::from(record.mode.to_string()),
            ])
        })
        .collect();

    let header = Row::new(vec!["When", "WPM", "Acc", "Errors", "Mode"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let scroll_info = if total_rows > table_height {
        format!(" ({}/{} rows)", offset + rows.len(), total_rows)
    } else {
        String::new()
    };

    Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Recent results{scroll_info}")),
    )
    .render(chunks[1], buf);

    Paragraph::new("(b)ack / (r)estart / up-down scroll / (esc)ape")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use velo::{
        config::{Config, FileConfigStore},
        history::{BEST_WPM_KEY, HISTORY_KEY},
        store::MemoryStore,
    };

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 20);
        let mut buffer = Buffer::empty(area);
        render_history(app, area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_history_says_so() {
        let dir = tempdir().unwrap();
        let app = App::new(
            Config::default(),
            FileConfigStore::with_path(dir.path().join("config.json")),
            Box::new(MemoryStore::new()),
            None,
        );
        assert!(rendered(&app).contains("No finished sessions yet"));
    }

    #[test]
    fn stored_results_are_listed() {
        let dir = tempdir().unwrap();
        let history = r#"[{"wpm":48,"accuracy":97,"timestamp":"2026-01-02T10:00:00+00:00","mode":{"mode":"timed","duration_secs":30,"difficulty":"medium","category":"code"}}]"#;
        let store = MemoryStore::new()
            .with_value(BEST_WPM_KEY, "48")
            .with_value(HISTORY_KEY, history);
        let app = App::new(
            Config::default(),
            FileConfigStore::with_path(dir.path().join("config.json")),
            Box::new(store),
            None,
        );

        let text = rendered(&app);
        assert!(text.contains("1 sessions"));
        assert!(text.contains("timed 30s / code / medium"));
    }
}
