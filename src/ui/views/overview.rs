use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::analytics::api_types::{AnomaliesPage, ClusterOverview, HotspotsReport, ProtocolPredictions};
use crate::analytics::Resource;
use crate::pagination::PageCursor;
use crate::pipeline::PageRequest;
use crate::query::{Query, RequestState};
use crate::ui::renderfns::{format_count, format_percent, harshness_color, load_title, placeholder};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::clusters::overview_request;
use crate::ui::views::hotspots::hotspots_request;
use crate::ui::views::{AnomaliesView, ClustersView, HotspotsView, ProtocolsView};

const TOP_DESTINATIONS: usize = 3;

/// One card per analysis, each with its own query.
///
/// Requests use the same page sizes as the detail views so the cache
/// entries are shared.
pub struct OverviewView {
  ctx: ViewContext,
  anomalies: Query<AnomaliesPage>,
  clusters: Query<ClusterOverview>,
  hotspots: Query<HotspotsReport>,
  protocols: Query<ProtocolPredictions>,
}

impl OverviewView {
  pub fn new(ctx: ViewContext) -> Self {
    let mut view = Self {
      ctx,
      anomalies: Query::new(),
      clusters: Query::new(),
      hotspots: Query::new(),
      protocols: Query::new(),
    };
    view.load_all();
    view
  }

  fn load_all(&mut self) {
    let ctx = &self.ctx;
    let sizes = &ctx.page_size;
    self.anomalies.load(
      &ctx.pipeline,
      PageRequest::new(Resource::Anomalies.endpoint(), PageCursor::first(sizes.anomalies)),
    );
    self.clusters.load(&ctx.pipeline, overview_request(ctx));
    self.hotspots.load(&ctx.pipeline, hotspots_request(ctx));
    self.protocols.load(
      &ctx.pipeline,
      PageRequest::new(Resource::Protocols.endpoint(), PageCursor::first(sizes.protocols)),
    );
  }

  /// Retry only the cards that failed
  fn retry_failed(&mut self) {
    let pipeline = &self.ctx.pipeline;
    if self.anomalies.is_failed() {
      self.anomalies.retry(pipeline);
    }
    if self.clusters.is_failed() {
      self.clusters.retry(pipeline);
    }
    if self.hotspots.is_failed() {
      self.hotspots.retry(pipeline);
    }
    if self.protocols.is_failed() {
      self.protocols.retry(pipeline);
    }
  }

  fn refetch_all(&mut self) {
    let pipeline = &self.ctx.pipeline;
    self.anomalies.refetch(pipeline);
    self.clusters.refetch(pipeline);
    self.hotspots.refetch(pipeline);
    self.protocols.refetch(pipeline);
  }
}

fn card<'a, T>(
  frame: &mut Frame,
  area: Rect,
  label: &str,
  hint: &str,
  state: &'a RequestState<T>,
  body: impl FnOnce(&'a T) -> Vec<Line<'static>>,
) {
  let block = Block::default()
    .title(load_title(label, state, None))
    .title_bottom(Line::styled(format!(" {} ", hint), Style::default().fg(Color::DarkGray)).right_aligned())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  match state.data() {
    Some(data) => frame.render_widget(Paragraph::new(body(data)).block(block), area),
    None => {
      if let Some(p) = placeholder(state) {
        frame.render_widget(p.block(block), area);
      }
    }
  }
}

fn anomalies_lines(page: &AnomaliesPage) -> Vec<Line<'static>> {
  vec![
    Line::from(format!("Total Logs: {}", format_count(page.total_logs))),
    Line::from(format!("Anomalies Detected: {}", format_count(page.anomaly_count))),
    Line::from(vec![
      Span::raw("Harshness: "),
      Span::styled(
        page.harshness.label(),
        Style::default().fg(harshness_color(page.harshness)).bold(),
      ),
    ]),
  ]
}

fn clusters_lines(overview: &ClusterOverview) -> Vec<Line<'static>> {
  vec![
    Line::from(format!("Total Logs: {}", format_count(overview.total_logs))),
    Line::from(format!("Total Clusters: {}", format_count(overview.total_clusters))),
  ]
}

fn hotspots_lines(report: &HotspotsReport) -> Vec<Line<'static>> {
  let mut lines = vec![
    Line::from(format!("Total Logs: {}", format_count(report.total_logs))),
    Line::from("Top Destinations:"),
  ];
  lines.extend(report.top_destinations.iter().take(TOP_DESTINATIONS).map(|d| {
    Line::from(format!(
      "  {} ({}, {}%)",
      d.name,
      format_count(d.count),
      d.percentage.round()
    ))
  }));
  lines
}

fn protocols_lines(predictions: &ProtocolPredictions) -> Vec<Line<'static>> {
  vec![
    Line::from(format!("Total Logs: {}", format_count(predictions.total_logs))),
    Line::from(format!(
      "Match Percentage: {}",
      format_percent(predictions.match_percentage)
    )),
    Line::from(format!(
      "Mismatch Count: {}",
      format_count(predictions.mismatch_count)
    )),
  ]
}

impl View for OverviewView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let ctx = self.ctx.clone();
    match key.code {
      KeyCode::Char('a') => ViewAction::Push(Box::new(AnomaliesView::new(ctx))),
      KeyCode::Char('c') => ViewAction::Push(Box::new(ClustersView::new(ctx))),
      KeyCode::Char('h') => ViewAction::Push(Box::new(HotspotsView::new(ctx))),
      KeyCode::Char('p') => ViewAction::Push(Box::new(ProtocolsView::new(ctx))),
      KeyCode::Char('r') => {
        self.retry_failed();
        ViewAction::None
      }
      KeyCode::Char('R') => {
        self.refetch_all();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [top, bottom] = Layout::vertical([Constraint::Percentage(50); 2]).areas(area);
    let [a, c] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(top);
    let [h, p] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(bottom);

    card(frame, a, "Anomalies", "a: open", self.anomalies.state(), anomalies_lines);
    card(frame, c, "Clusters", "c: open", self.clusters.state(), clusters_lines);
    card(frame, h, "Hotspots", "h: open", self.hotspots.state(), hotspots_lines);
    card(frame, p, "Protocols", "p: open", self.protocols.state(), protocols_lines);
  }

  fn breadcrumb_label(&self) -> String {
    "Overview".to_string()
  }

  fn tick(&mut self) {
    // Each card settles on its own
    self.anomalies.poll();
    self.clusters.poll();
    self.hotspots.poll();
    self.protocols.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a/c/h/p", "open").with_priority(20),
      ShortcutInfo::new("r", "retry").with_priority(40),
      ShortcutInfo::new("R", "reload").with_priority(50),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
