use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

use crate::analytics::api_types::ClusterLogsPage;
use crate::analytics::Resource;
use crate::pager::Pager;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_count, format_length, load_title, placeholder, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Stats and paginated logs for one cluster
pub struct ClusterDetailView {
  ctx: ViewContext,
  resource: Resource,
  pager: Pager<ClusterLogsPage>,
  table_state: TableState,
}

impl ClusterDetailView {
  pub fn new(ctx: ViewContext, cluster: i64) -> Self {
    let resource = Resource::ClusterLogs { cluster };
    let mut pager = Pager::new(resource.endpoint(), ctx.page_size.cluster_logs);
    pager.load(&ctx.pipeline);

    Self {
      ctx,
      resource,
      pager,
      table_state: TableState::default(),
    }
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let title = format!("{} Stats", self.resource.title());
    let block = Block::default()
      .title(load_title(&title, state, None))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(page) = state.data() else {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    let line = Line::from(vec![
      Span::raw(format!("Logs: {}", format_count(page.total_logs))),
      Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
      Span::raw(format!("Average Length: {}", format_length(page.stats.avg_length))),
      Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
      Span::raw(format!("Min Length: {}", format_length(page.stats.min_length))),
      Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
      Span::raw(format!("Max Length: {}", format_length(page.stats.max_length))),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
  }

  fn render_logs(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let title = format!("{} Logs", self.resource.title());
    let block = Block::default()
      .title(load_title(&title, state, Some(self.pager.label())))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(page) = state.data() else {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    if page.logs.is_empty() {
      let empty = Paragraph::new("No logs on this page.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(empty, area);
      return;
    }

    let first = self.pager.cursor().first_item_number();
    let rows: Vec<Row> = page
      .logs
      .iter()
      .enumerate()
      .map(|(i, log)| {
        Row::new(vec![
          (first + i as u64).to_string(),
          format!("{}", log.length),
          truncate(&log.source, 39),
          truncate(&log.destination, 39),
          log.protocol.clone(),
          log.info.clone().unwrap_or_default(),
        ])
      })
      .collect();
    let len = rows.len();

    let header = Row::new(["#", "Length", "Source", "Destination", "Protocol", "Info"])
      .style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(
      rows,
      [
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Fill(1),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    ensure_valid_selection(&mut self.table_state, len);
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

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

impl View for ClusterDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [stats, logs] = Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).areas(area);
    self.render_stats(frame, stats);
    self.render_logs(frame, logs);
  }

  fn breadcrumb_label(&self) -> String {
    self.resource.title()
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
