use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table};

use crate::analytics::api_types::{HotspotsReport, RankedEntry};
use crate::analytics::Resource;
use crate::pagination::PageCursor;
use crate::pipeline::PageRequest;
use crate::query::Query;
use crate::ui::renderfns::{
  cache_note, format_count, format_length, format_percent, load_title, placeholder,
  truncate,
};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Busiest destinations, sources and protocols
pub struct HotspotsView {
  ctx: ViewContext,
  query: Query<HotspotsReport>,
}

impl HotspotsView {
  pub fn new(ctx: ViewContext) -> Self {
    let mut query = Query::new();
    query.load(&ctx.pipeline, hotspots_request(&ctx));
    Self { ctx, query }
  }

  fn render_cards(&self, frame: &mut Frame, area: Rect, report: &HotspotsReport) {
    let cards = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);

    let top = |entries: &[RankedEntry]| {
      entries
        .first()
        .map(|e| format!("{} ({})", truncate(&e.name, 24), format_count(e.count)))
        .unwrap_or_else(|| "-".to_string())
    };
    let stats = &report.length_stats;
    let values = [
      ("Total Logs", format_count(report.total_logs)),
      ("Top Destination", top(&report.top_destinations)),
      ("Top Protocol", top(&report.top_protocols)),
      (
        "Length avg/min/max",
        format!(
          "{} / {} / {}",
          format_length(stats.avg_length),
          format_length(stats.min_length),
          format_length(stats.max_length)
        ),
      ),
    ];

    for ((label, value), card) in values.into_iter().zip(cards.iter()) {
      let block = Block::default()
        .title(format!(" {} ", label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
      let paragraph = Paragraph::new(Line::styled(value, Style::default().fg(Color::Cyan).bold()))
        .alignment(Alignment::Center)
        .block(block);
      frame.render_widget(paragraph, *card);
    }
  }

  fn render_ranking(&self, frame: &mut Frame, area: Rect, title: &str, entries: &[RankedEntry]) {
    let block = Block::default()
      .title(format!(" {} ", title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let bars: Vec<Bar> = entries
      .iter()
      .map(|e| {
        Bar::default()
          .value(e.count)
          .label(Line::from(truncate(&e.name, 15)))
          .text_value(format_count(e.count))
      })
      .collect();

    // Horizontal bars leave room for address labels
    let chart = BarChart::default()
      .block(block)
      .direction(Direction::Horizontal)
      .data(BarGroup::default().bars(&bars))
      .bar_width(1)
      .bar_gap(0)
      .bar_style(Style::default().fg(Color::Green))
      .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_widget(chart, area);
  }

  fn render_protocols(&self, frame: &mut Frame, area: Rect, report: &HotspotsReport) {
    let title = match cache_note(self.query.cached_at()) {
      Some(note) => format!(" Top Protocols ({}) ", note),
      None => " Top Protocols ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let rows: Vec<Row> = report
      .top_protocols
      .iter()
      .map(|p| {
        Row::new(vec![
          p.name.clone(),
          format_count(p.count),
          format_percent(p.percentage),
        ])
      })
      .collect();

    let header = Row::new(["Protocol", "Count", "Percentage"]).style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(rows, [Constraint::Fill(2), Constraint::Fill(1), Constraint::Fill(1)])
      .header(header)
      .block(block);
    frame.render_widget(table, area);
  }
}

/// Rows plus borders and header, capped at the largest terminal height
fn table_height(rows: usize) -> u16 {
  u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(3)
}

/// The report is not paginated; page 1 at the default size
pub(crate) fn hotspots_request(ctx: &ViewContext) -> PageRequest {
  PageRequest::new(Resource::Hotspots.endpoint(), PageCursor::first(ctx.page_size.default))
}

impl View for HotspotsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.query.retry(&self.ctx.pipeline),
      KeyCode::Char('R') => self.query.refetch(&self.ctx.pipeline),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.query.state();
    let Some(report) = state.data() else {
      let block = Block::default()
        .title(load_title("Hotspots", state, None))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    let [cards, charts, protocols] = Layout::vertical([
      Constraint::Length(3),
      Constraint::Min(8),
      Constraint::Length(table_height(report.top_protocols.len())),
    ])
    .areas(area);
    let [destinations, sources] =
      Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(charts);

    self.render_cards(frame, cards, report);
    self.render_ranking(frame, destinations, "Top Destinations", &report.top_destinations);
    self.render_ranking(frame, sources, "Top Sources", &report.top_sources);
    self.render_protocols(frame, protocols, report);
  }

  fn breadcrumb_label(&self) -> String {
    Resource::Hotspots.title()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "retry").with_priority(40),
      ShortcutInfo::new("R", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
