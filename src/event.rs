use crossterm::event::{self, Event as TermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Input to the main loop.
#[derive(Debug)]
pub enum Event {
  Key(KeyEvent),
  /// Terminal was resized; redraw
  Resize,
  /// Timer tick; views poll their queries on this
  Tick,
}

/// Merges terminal input and a tick timer into one channel.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm polling blocks, so it gets its own thread
    tokio::task::spawn_blocking(move || loop {
      let next = match event::poll(tick_rate) {
        Ok(true) => match event::read() {
          // Windows reports releases too
          Ok(TermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
          Ok(TermEvent::Resize(_, _)) => Some(Event::Resize),
          _ => None,
        },
        _ => Some(Event::Tick),
      };

      if let Some(evt) = next {
        if tx.send(evt).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
