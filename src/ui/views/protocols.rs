use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

use crate::analytics::api_types::{LogRecord, ProtocolPredictions};
use crate::analytics::Resource;
use crate::pager::Pager;
use crate::query::RequestState;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_count, format_percent, load_title, placeholder};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Actual vs. predicted protocol per packet, mismatches highlighted
pub struct ProtocolsView {
  ctx: ViewContext,
  pager: Pager<ProtocolPredictions>,
  table_state: TableState,
}

impl ProtocolsView {
  pub fn new(ctx: ViewContext) -> Self {
    let mut pager = Pager::new(Resource::Protocols.endpoint(), ctx.page_size.protocols);
    pager.load(&ctx.pipeline);

    Self {
      ctx,
      pager,
      table_state: TableState::default(),
    }
  }

  fn render_cards(&self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let cards = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);

    let values: [(&str, Option<String>); 3] = match state.data() {
      Some(p) => [
        ("Total Logs", Some(format_count(p.total_logs))),
        ("Match Percentage", Some(format_percent(p.match_percentage))),
        ("Mismatch Count", Some(format_count(p.mismatch_count))),
      ],
      None => [("Total Logs", None), ("Match Percentage", None), ("Mismatch Count", None)],
    };

    for ((label, value), card) in values.into_iter().zip(cards.iter()) {
      let block = Block::default()
        .title(format!(" {} ", label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
      let text = match (&value, state) {
        (Some(v), _) => Span::styled(v.clone(), Style::default().fg(Color::Cyan).bold()),
        (None, RequestState::Loading) => Span::styled("...", Style::default().fg(Color::DarkGray)),
        (None, _) => Span::styled("-", Style::default().fg(Color::DarkGray)),
      };
      frame.render_widget(
        Paragraph::new(Line::from(text)).alignment(Alignment::Center).block(block),
        *card,
      );
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.pager.query().state();
    let block = Block::default()
      .title(load_title("Logs", state, Some(self.pager.label())))
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
      let empty = Paragraph::new("No predictions on this page.")
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
      .map(|(i, log)| prediction_row(first + i as u64, log))
      .collect();
    let len = rows.len();

    let header = Row::new(["#", "Length", "Actual Protocol", "Predicted Protocol", "Mismatch"])
      .style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(
      rows,
      [
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(9),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
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

fn prediction_row(number: u64, log: &LogRecord) -> Row<'static> {
  let mismatch = log.mismatch.unwrap_or(false);
  let row = Row::new(vec![
    number.to_string(),
    format!("{}", log.length),
    log.protocol.clone(),
    log.predicted_protocol.clone().unwrap_or_else(|| "-".to_string()),
    if mismatch { "Yes" } else { "No" }.to_string(),
  ]);
  if mismatch {
    row.style(Style::default().fg(Color::Red))
  } else {
    row
  }
}

impl View for ProtocolsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [cards, table] = Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).areas(area);
    self.render_cards(frame, cards);
    self.render_table(frame, table);
  }

  fn breadcrumb_label(&self) -> String {
    Resource::Protocols.title()
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
