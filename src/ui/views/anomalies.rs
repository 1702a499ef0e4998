use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, TableState};

use crate::analytics::api_types::AnomaliesPage;
use crate::analytics::Resource;
use crate::pager::Pager;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{
  format_count, format_timestamp, harshness_color, load_title, placeholder, truncate,
};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Paginated list of anomalous packets
pub struct AnomaliesView {
  ctx: ViewContext,
  pager: Pager<AnomaliesPage>,
  table_state: TableState,
}

impl AnomaliesView {
  pub fn new(ctx: ViewContext) -> Self {
    let mut pager = Pager::new(Resource::Anomalies.endpoint(), ctx.page_size.anomalies);
    pager.load(&ctx.pipeline);

    Self {
      ctx,
      pager,
      table_state: TableState::default(),
    }
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let block = Block::default()
      .title(load_title("Summary", state, None))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(page) = state.data() else {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    let lines = vec![
      Line::from(format!("Total Logs: {}", format_count(page.total_logs))),
      Line::from(format!("Anomalies Detected: {}", format_count(page.anomaly_count))),
      Line::from(vec![
        Span::raw("Harshness Level: "),
        Span::styled(
          page.harshness.label(),
          Style::default().fg(harshness_color(page.harshness)).bold(),
        ),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_chart(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Anomaly Lengths ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(page) = self.pager.query().data() else {
      frame.render_widget(block, area);
      return;
    };

    let first = self.pager.cursor().first_item_number();
    let bars: Vec<Bar> = page
      .anomalies
      .iter()
      .enumerate()
      .map(|(i, record)| {
        Bar::default()
          .value(record.length.max(0.0) as u64)
          .label(Line::from(format!("A{}", first + i as u64)))
      })
      .collect();

    let chart = BarChart::default()
      .block(block)
      .data(BarGroup::default().bars(&bars))
      .bar_width(5)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Cyan))
      .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(chart, area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let block = Block::default()
      .title(load_title("Anomalies", state, Some(self.pager.label())))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(page) = state.data() else {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    if page.anomalies.is_empty() {
      let empty = Paragraph::new("No anomalies on this page.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(empty, area);
      return;
    }

    let now = Local::now();
    let first = self.pager.cursor().first_item_number();
    let rows: Vec<Row> = page
      .anomalies
      .iter()
      .enumerate()
      .map(|(i, record)| {
        Row::new(vec![
          (first + i as u64).to_string(),
          format_timestamp(record.timestamp, now),
          truncate(&record.source, 39),
          truncate(&record.destination, 39),
          format!("{}", record.length),
        ])
      })
      .collect();
    let len = rows.len();

    let header = Row::new(["#", "Timestamp", "Source", "Destination", "Length"])
      .style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(
      rows,
      [
        Constraint::Length(6),
        Constraint::Length(20),
        Constraint::Min(16),
        Constraint::Min(16),
        Constraint::Length(8),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    ensure_valid_selection(&mut self.table_state, len);
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        if self.pager.next_page(&self.ctx.pipeline) {
          self.table_state.select(None);
        }
      }
      KeyCode::Char('p') | KeyCode::Left => {
        if self.pager.prev_page(&self.ctx.pipeline) {
          self.table_state.select(None);
        }
      }
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => self.pager.retry(&self.ctx.pipeline),
      KeyCode::Char('R') => self.pager.refetch(&self.ctx.pipeline),
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

impl View for AnomaliesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [top, bottom] = Layout::vertical([Constraint::Length(12), Constraint::Min(5)]).areas(area);
    let [summary, chart] =
      Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(top);

    self.render_summary(frame, summary);
    self.render_chart(frame, chart);
    self.render_table(frame, bottom);
  }

  fn breadcrumb_label(&self) -> String {
    Resource::Anomalies.title()
  }

  fn tick(&mut self) {
    if self.pager.poll() {
      self.table_state.select(None);
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("n/p", "page").with_priority(20),
      ShortcutInfo::new("r", "retry").with_priority(40),
      ShortcutInfo::new("R", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
