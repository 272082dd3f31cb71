pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::{
    app::App,
    clock::{display_position, format_mmss, PlaybackClock},
    judge::Band,
    report::SessionReport,
    session::SessionState,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn band_color(band: Option<Band>) -> Color {
    match band {
        Some(Band::Success) => Color::Green,
        Some(Band::Early) => Color::Blue,
        Some(Band::Late) => Color::Red,
        None => Color::Gray,
    }
}

impl<C: PlaybackClock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.session.state(), self.session.report()) {
            (SessionState::Complete, Some(report)) => render_report(self, report, area, buf),
            _ => render_training(self, area, buf),
        }
    }
}

fn render_training<C: PlaybackClock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let session = &app.session;
    let presentation = session.presentation();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // source files
            Constraint::Min(1),    // padding
            Constraint::Length(1), // feedback
            Constraint::Min(1),    // padding
            Constraint::Length(1), // tally
            Constraint::Length(1), // playback position
            Constraint::Length(1), // legend
        ])
        .split(area);

    let source = match &app.settings.video {
        Some(video) => format!(
            "{}  +  {}",
            video.display(),
            app.settings.timings_path.display()
        ),
        None => app.settings.timings_path.display().to_string(),
    };
    Paragraph::new(Span::styled(source, dim_style))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let feedback_style = Style::default()
        .patch(bold_style)
        .fg(band_color(presentation.feedback.band));
    Paragraph::new(Span::styled(presentation.feedback.text.clone(), feedback_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let t = presentation.tally;
    Paragraph::new(Span::styled(
        format!(
            "HITS: {} | EARLY: {} | LATE: {} | MISS: {}",
            t.hits, t.early, t.late, t.miss
        ),
        Style::default().fg(Color::White).bg(Color::Rgb(0x33, 0x33, 0x33)),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    let clock = session.clock();
    let total = clock
        .duration()
        .map(format_mmss)
        .unwrap_or_else(|| "--:--".to_string());
    let (done, cues) = session.progress();
    Paragraph::new(Span::styled(
        format!(
            "{} {} / {}   cue {}/{}",
            if clock.is_playing() { "playing" } else { "paused" },
            format_mmss(display_position(clock)),
            total,
            done,
            cues
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    let legend = if session.is_training() {
        format!("({}) cue / (s)top / (r)eset / (esc)ape", app.settings.cue_key)
    } else {
        "(s)tart / (r)eset / (space) play-pause / (←→) seek / (esc)ape".to_string()
    };
    Paragraph::new(Span::styled(legend, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}

fn render_report<C: PlaybackClock>(
    app: &App<C>,
    report: &SessionReport,
    area: Rect,
    buf: &mut Buffer,
) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),  // accuracy
            Constraint::Length(3),  // summary
            Constraint::Min(6),     // offsets chart
            Constraint::Length(10), // per-cue log
            Constraint::Length(1),  // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Training Accuracy: {:.2}%", report.accuracy()),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let summary: Vec<Line> = report
        .summary_lines()
        .into_iter()
        .chain(report.timing_line())
        .map(Line::from)
        .collect();
    Paragraph::new(summary)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let points = charting::offset_points(&report.log);
    let (x_bounds, y_range) = charting::compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Scatter)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds(x_bounds)
                .labels(vec![
                    Span::styled(charting::format_label(x_bounds[0]), bold_style),
                    Span::styled(charting::format_label(x_bounds[1]), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("offset ms")
                .bounds([-y_range, y_range])
                .labels(vec![
                    Span::styled(charting::format_label(-y_range), bold_style),
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(y_range), bold_style),
                ]),
        )
        .render(chunks[2], buf);

    // Most recent cues last; keep the tail when the log outgrows the box.
    let visible = chunks[3].height.saturating_sub(2) as usize;
    let lines: Vec<String> = report.log_lines().collect();
    let tail: Vec<Line> = lines
        .iter()
        .skip(lines.len().saturating_sub(visible))
        .map(|l| Line::from(l.as_str()))
        .collect();
    Paragraph::new(tail)
        .block(Block::default().borders(Borders::ALL).title("Cues"))
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        format!(
            "(s) train again / (r)eset / (esc)ape   [{} cues from {}]",
            report.stats.total(),
            app.settings.timings_path.display()
        ),
        italic_style,
    ))
    .render(chunks[4], buf);
}
