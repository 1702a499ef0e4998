use super::KeyResult;
use crate::commands::{self, Command, CommandKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

/// Events emitted by the command palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// A known command was chosen
  Run(CommandKind),
  /// Enter on input that matches nothing
  Unknown(String),
  Cancelled,
}

/// `:` command palette with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  buffer: String,
  active: bool,
  selected: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.reset();
  }

  fn reset(&mut self) {
    self.buffer.clear();
    self.selected = 0;
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.buffer)
  }

  /// Handle a key, including the `:` that opens the palette
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.active = false;
        self.reset();
        KeyResult::Event(CommandEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.active = false;
        let event = self.resolve();
        self.reset();
        KeyResult::Event(event)
      }
      KeyCode::Tab | KeyCode::Down => {
        let count = self.suggestions().len().min(MAX_SUGGESTIONS);
        if count > 0 {
          self.selected = (self.selected + 1) % count;
        }
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = self.suggestions().len().min(MAX_SUGGESTIONS);
        if count > 0 {
          self.selected = (self.selected + count - 1) % count;
        }
        KeyResult::Handled
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.reset();
        KeyResult::Handled
      }
      KeyCode::Backspace => {
        self.buffer.pop();
        self.selected = 0;
        KeyResult::Handled
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.buffer.push(c);
        self.selected = 0;
        KeyResult::Handled
      }
      // Swallow everything else while the palette is open
      _ => KeyResult::Handled,
    }
  }

  /// Highlighted suggestion if there is one, otherwise the typed text
  fn resolve(&self) -> CommandEvent {
    if let Some(cmd) = self.suggestions().get(self.selected) {
      return CommandEvent::Run(cmd.kind);
    }
    match commands::find(&self.buffer) {
      Some(cmd) => CommandEvent::Run(cmd.kind),
      None => CommandEvent::Unknown(self.buffer.trim().to_string()),
    }
  }

  /// Render the palette if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;

    let width = (area.width / 5 * 3).clamp(30, 60).min(area.width);
    let height = (3 + shown).min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let [input_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(self.buffer.as_str()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), input_area);

    if suggestions.is_empty() || list_area.height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<12}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(self.selected));
    frame.render_stateful_widget(list, list_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(input: &mut CommandInput, text: &str) {
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut input = CommandInput::new();
    assert_eq!(input.handle_key(key(KeyCode::Char('n'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_colon_activates() {
    let mut input = CommandInput::new();
    assert_eq!(input.handle_key(key(KeyCode::Char(':'))), KeyResult::Handled);
    assert!(input.is_active());
  }

  #[test]
  fn test_enter_runs_top_suggestion() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "hot");

    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Run(CommandKind::Hotspots))
    );
    assert!(!input.is_active());
    assert_eq!(input.value(), "");
  }

  #[test]
  fn test_tab_cycles_suggestions() {
    let mut input = CommandInput::new();
    input.activate();
    // Empty input lists every command in palette order
    input.handle_key(key(KeyCode::Tab));

    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Run(CommandKind::Anomalies))
    );
  }

  #[test]
  fn test_unknown_command() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "zzz");

    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Unknown("zzz".to_string()))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "clu");

    assert_eq!(
      input.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(CommandEvent::Cancelled)
    );
    assert!(!input.is_active());
  }

  #[test]
  fn test_backspace_edits() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "quix");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "qui");
  }
}
