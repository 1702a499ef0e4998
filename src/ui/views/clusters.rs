use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, TableState};

use crate::analytics::api_types::ClusterOverview;
use crate::analytics::Resource;
use crate::pagination::PageCursor;
use crate::pipeline::PageRequest;
use crate::query::Query;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{cache_note, format_count, format_length, load_title, placeholder};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::ClusterDetailView;

/// Cluster overview: summary, per-cluster stats and average lengths
pub struct ClustersView {
  ctx: ViewContext,
  query: Query<ClusterOverview>,
  table_state: TableState,
}

impl ClustersView {
  pub fn new(ctx: ViewContext) -> Self {
    let mut query = Query::new();
    query.load(&ctx.pipeline, overview_request(&ctx));

    Self {
      ctx,
      query,
      table_state: TableState::default(),
    }
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect) {
    let state = self.query.state();
    let block = Block::default()
      .title(load_title("Overview Summary", state, None))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    match state.data() {
      Some(overview) => {
        let lines = vec![
          Line::from(format!("Total Logs: {}", format_count(overview.total_logs))),
          Line::from(format!("Total Clusters: {}", format_count(overview.total_clusters))),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
      }
      None => {
        if let Some(p) = placeholder(state) {
          frame.render_widget(p.block(block), area);
        }
      }
    }
  }

  fn render_chart(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Cluster Average Length ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(overview) = self.query.data() else {
      frame.render_widget(block, area);
      return;
    };

    let bars: Vec<Bar> = overview
      .clusters
      .iter()
      .map(|c| {
        Bar::default()
          .value(c.avg_length.max(0.0).round() as u64)
          .label(Line::from(format!("C{}", c.cluster)))
      })
      .collect();

    let chart = BarChart::default()
      .block(block)
      .data(BarGroup::default().bars(&bars))
      .bar_width(6)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Magenta))
      .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
    frame.render_widget(chart, area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.query.state();
    let block = Block::default()
      .title(load_title("Clusters", state, cache_note(self.query.cached_at())))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(overview) = state.data() else {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
      return;
    };

    if overview.clusters.is_empty() {
      let empty = Paragraph::new("No clusters found.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(empty, area);
      return;
    }

    let rows: Vec<Row> = overview
      .clusters
      .iter()
      .map(|c| {
        Row::new(vec![
          c.cluster.to_string(),
          format_count(c.size),
          format_length(Some(c.avg_length)),
          format_length(Some(c.min_length)),
          format_length(Some(c.max_length)),
        ])
      })
      .collect();
    let len = rows.len();

    let header = Row::new(["Cluster ID", "Size", "Avg Length", "Min Length", "Max Length"])
      .style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(rows, [Constraint::Ratio(1, 5); 5])
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    ensure_valid_selection(&mut self.table_state, len);
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn selected_cluster(&self) -> Option<i64> {
    let idx = self.table_state.selected()?;
    self.query.data()?.clusters.get(idx).map(|c| c.cluster)
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Enter => {
        let cluster = self.selected_cluster()?;
        return Some(ViewAction::Push(Box::new(ClusterDetailView::new(
          self.ctx.clone(),
          cluster,
        ))));
      }
      KeyCode::Char('r') => self.query.retry(&self.ctx.pipeline),
      KeyCode::Char('R') => self.query.refetch(&self.ctx.pipeline),
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

/// The overview is not paginated; page 1 at the default size
pub(crate) fn overview_request(ctx: &ViewContext) -> PageRequest {
  PageRequest::new(
    Resource::ClusterOverview.endpoint(),
    PageCursor::first(ctx.page_size.default),
  )
}

impl View for ClustersView {
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
    Resource::ClusterOverview.title()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "logs").with_priority(20),
      ShortcutInfo::new("r", "retry").with_priority(40),
      ShortcutInfo::new("R", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
