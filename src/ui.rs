pub mod charting;
pub mod history;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};
use velo::{
    celebration::Celebration,
    history::SessionOutcome,
    session::{CharState, TimerMode},
    stats,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const CONFETTI_COLORS: [Color; 6] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Blue,
];

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::History => history::render_history(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.engine.session();
    let passage = session.passage_text();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines = if passage.width() <= max_chars_per_line as usize {
        1
    } else {
        ((passage.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2), // stats bar
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(1),
            Constraint::Length(2), // settings + keys
        ])
        .split(area);

    Paragraph::new(stats_line(app))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let green = bold().fg(Color::Green);
    let red = bold().fg(Color::Red).add_modifier(Modifier::UNDERLINED);
    let cursor = dim_bold().add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);

    let spans: Vec<Span> = session
        .passage()
        .iter()
        .zip(session.char_states())
        .enumerate()
        .map(|(idx, (expected, state))| match state {
            CharState::Correct => Span::styled(expected.to_string(), green),
            CharState::Incorrect => {
                let typed = session.input()[idx];
                let shown = if typed == ' ' { '·' } else { typed };
                Span::styled(shown.to_string(), red)
            }
            CharState::Pending if idx == session.cursor() => {
                Span::styled(expected.to_string(), cursor)
            }
            CharState::Pending => Span::styled(expected.to_string(), dim_bold()),
        })
        .collect();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            // a short passage reads best centered
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    Paragraph::new(vec![settings_line(app), Line::from(Span::styled(
        "tab restart / ^d difficulty / ^g category / ^t mode / ^l duration / ^s sound / esc quit",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))])
    .alignment(Alignment::Center)
    .render(chunks[4], buf);
}

fn stats_line(app: &App) -> Line<'static> {
    let session = app.engine.session();
    let live = session.stats();
    let label = Style::default().add_modifier(Modifier::DIM);

    let timer = match session.config().mode {
        TimerMode::Timed => format!("{}s", session.timer()),
        TimerMode::Passage => format!("{}s elapsed", session.timer()),
    };
    let best = app
        .engine
        .scoreboard()
        .best_wpm()
        .map_or_else(|| "-".to_string(), |b| b.to_string());

    Line::from(vec![
        Span::styled("wpm ", label),
        Span::styled(live.wpm.to_string(), bold()),
        Span::styled("   acc ", label),
        Span::styled(format!("{}%", live.accuracy), bold()),
        Span::styled("   streak ", label),
        Span::styled(session.streak().to_string(), bold().fg(Color::Yellow)),
        Span::styled("   best ", label),
        Span::styled(best, bold()),
        Span::styled("   ", label),
        Span::styled(timer, bold().fg(Color::Red)),
    ])
}

fn settings_line(app: &App) -> Line<'static> {
    let config = app.engine.session().config();
    let duration = match config.mode {
        TimerMode::Timed => format!("{}s", config.duration_secs),
        TimerMode::Passage => "untimed".to_string(),
    };
    let source = if app.custom_prompt.is_some() {
        "custom prompt".to_string()
    } else {
        format!("{} / {}", config.category, config.difficulty)
    };

    Line::from(Span::styled(
        format!(
            "{} / {} / sound {}",
            source,
            duration,
            if app.config.sound { "on" } else { "off" }
        ),
        Style::default().fg(Color::Cyan),
    ))
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // banner
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let session = app.engine.session();
    let best = app.engine.scoreboard().best_wpm().unwrap_or(0);

    if let Some((record, outcome)) = &app.last_result {
        let (text, style) = match outcome {
            SessionOutcome::Baseline => (
                format!("Baseline set: {} wpm. Now beat it.", record.wpm),
                bold().fg(Color::Cyan),
            ),
            SessionOutcome::HighScore => (
                format!("{} {} wpm", app.celebration.banner, record.wpm),
                bold().fg(Color::Yellow),
            ),
            SessionOutcome::Completed => (
                format!("Test complete. Personal best: {best} wpm"),
                bold().fg(Color::Green),
            ),
        };
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let sd = stats::consistency(session.samples())
            .map_or_else(|| "-".to_string(), |sd| format!("{sd:.2}"));
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {} mistakes   {} best streak   {}s   {} sd   [{}]",
                record.wpm,
                record.accuracy,
                record.mistakes,
                record.best_streak,
                record.seconds_elapsed,
                sd,
                record.mode
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(session.samples(), session.config().duration_secs);
    let tuples: Vec<(f64, f64)> = session.samples().iter().map(|&p| p.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm.max(1.0)])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_wpm), bold()),
                ]),
        )
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(r)estart / (h)istory / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);

    if app.celebration.is_active {
        render_confetti(&app.celebration, area, buf);
    }
}

/// Draw confetti over whatever is already in the buffer
fn render_confetti(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    for piece in celebration.visible() {
        let (x, y) = (piece.x as u16, piece.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }
        let color = CONFETTI_COLORS[piece.color_index % CONFETTI_COLORS.len()];
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_char(piece.symbol);
            cell.set_style(bold().fg(color));
        }
    }
}
