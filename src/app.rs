use crate::commands::CommandKind;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::pipeline::Pipeline;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction, ViewContext};
use crate::ui::views::{AnomaliesView, ClustersView, HotspotsView, OverviewView, ProtocolsView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Root view shown at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StartView {
  #[default]
  Overview,
  Anomalies,
  Clusters,
  Hotspots,
  Protocols,
}

/// Main application state
pub struct App {
  /// Navigation stack; the root is at index 0
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  ctx: ViewContext,
  config: Config,
  /// One-line message for the footer, cleared on the next key
  status: Option<String>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, pipeline: Pipeline, start: StartView) -> Self {
    let ctx = ViewContext {
      pipeline,
      page_size: config.page_size.clone(),
    };

    let mut app = Self {
      view_stack: Vec::new(),
      command: CommandInput::new(),
      ctx,
      config,
      status: None,
      should_quit: false,
    };
    app.set_root(start);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let [header, body, footer] = Layout::vertical([
      Constraint::Length(1),
      Constraint::Min(1),
      Constraint::Length(1),
    ])
    .areas(frame.area());

    let shortcuts = self.view_stack.last().map(|v| v.shortcuts()).unwrap_or_default();
    draw_header(
      frame,
      header,
      &self.config.backend.url,
      self.config.title.as_deref(),
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, body);
    }
    self.command.render_overlay(frame, body);

    draw_footer(frame, footer, &self.breadcrumb(), self.status.as_deref());
  }

  fn tick(&mut self) {
    // Only the visible view polls; views underneath pick up results when shown
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    self.status = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
      KeyResult::Event(CommandEvent::Run(kind)) => {
        self.run_command(kind);
        return;
      }
      KeyResult::Event(CommandEvent::Unknown(input)) => {
        self.status = Some(format!("Unknown command: {}", input));
        return;
      }
      KeyResult::NotHandled => {}
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        // Popping the root quits
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn run_command(&mut self, kind: CommandKind) {
    match kind {
      CommandKind::Overview => self.set_root(StartView::Overview),
      CommandKind::Anomalies => self.set_root(StartView::Anomalies),
      CommandKind::Clusters => self.set_root(StartView::Clusters),
      CommandKind::Hotspots => self.set_root(StartView::Hotspots),
      CommandKind::Protocols => self.set_root(StartView::Protocols),
      CommandKind::ClearCache => match self.ctx.pipeline.clear_cache() {
        Ok(removed) => {
          info!(removed, "cache cleared");
          self.status = Some(format!("Cleared {} cached responses", removed));
        }
        Err(e) => {
          warn!(error = %e, "failed to clear cache");
          self.status = Some(format!("Failed to clear cache: {}", e));
        }
      },
      CommandKind::Quit => self.should_quit = true,
    }
  }

  /// Replace the whole stack with a fresh root view
  fn set_root(&mut self, start: StartView) {
    let ctx = self.ctx.clone();
    let root: Box<dyn View> = match start {
      StartView::Overview => Box::new(OverviewView::new(ctx)),
      StartView::Anomalies => Box::new(AnomaliesView::new(ctx)),
      StartView::Clusters => Box::new(ClustersView::new(ctx)),
      StartView::Hotspots => Box::new(HotspotsView::new(ctx)),
      StartView::Protocols => Box::new(ProtocolsView::new(ctx)),
    };
    // Dropping the old views aborts their in-flight loads
    self.view_stack.clear();
    self.view_stack.push(root);
  }

  fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheLayer, SqliteStorage};
  use crate::pipeline::testing::FakeBackend;
  use std::sync::Arc;

  fn app(start: StartView) -> (App, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pipeline = Pipeline::from_parts(Arc::new(backend.clone()), CacheLayer::from_shared(storage));
    (App::new(Config::default(), pipeline, start), backend)
  }

  fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_command(app: &mut App, command: &str) {
    press(app, KeyCode::Char(':'));
    for c in command.chars() {
      press(app, KeyCode::Char(c));
    }
    press(app, KeyCode::Enter);
  }

  #[tokio::test]
  async fn test_starts_on_requested_view() {
    let (app, _backend) = app(StartView::Hotspots);
    assert_eq!(app.breadcrumb(), vec!["Hotspots"]);
  }

  #[tokio::test]
  async fn test_overview_loads_every_card() {
    let (app, backend) = app(StartView::Overview);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(app.breadcrumb(), vec!["Overview"]);
    assert_eq!(backend.calls(), 4);
  }

  #[tokio::test]
  async fn test_push_and_pop() {
    let (mut app, _backend) = app(StartView::Overview);
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.breadcrumb(), vec!["Overview", "Anomalies"]);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.breadcrumb(), vec!["Overview"]);
    assert!(!app.should_quit);

    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_command_replaces_root() {
    let (mut app, _backend) = app(StartView::Overview);
    press(&mut app, KeyCode::Char('c'));
    type_command(&mut app, "protocols");
    assert_eq!(app.breadcrumb(), vec!["Protocols"]);
  }

  #[tokio::test]
  async fn test_unknown_command_sets_status() {
    let (mut app, _backend) = app(StartView::Overview);
    type_command(&mut app, "zzz");
    assert_eq!(app.status.as_deref(), Some("Unknown command: zzz"));
    assert_eq!(app.breadcrumb(), vec!["Overview"]);
  }

  #[tokio::test]
  async fn test_clear_command_reports_count() {
    let (mut app, _backend) = app(StartView::Hotspots);
    type_command(&mut app, "clear");
    assert_eq!(app.status.as_deref(), Some("Cleared 0 cached responses"));
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let (mut app, _backend) = app(StartView::Overview);
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}
