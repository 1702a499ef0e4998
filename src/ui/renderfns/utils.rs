use chrono::{DateTime, Duration, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use crate::analytics::api_types::Harshness;
use crate::query::RequestState;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for an anomaly harshness level
pub fn harshness_color(harshness: Harshness) -> Color {
  match harshness {
    Harshness::Critical => Color::Red,
    Harshness::High => Color::LightRed,
    Harshness::Moderate => Color::Yellow,
    Harshness::Low => Color::Green,
    Harshness::NoData | Harshness::Unknown => Color::DarkGray,
  }
}

/// Render a capture timestamp as local wall-clock time.
///
/// The backend reports how long before now a packet was seen, in tenths of
/// a second. Values outside the representable date range render as "-".
pub fn format_timestamp(value: Option<f64>, now: DateTime<Local>) -> String {
  value
    .filter(|tenths| tenths.is_finite())
    .and_then(|tenths| Duration::try_milliseconds((tenths * 100.0) as i64))
    .and_then(|ago| now.checked_sub_signed(ago))
    .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S").to_string())
}

pub fn format_percent(value: f64) -> String {
  format!("{:.2}%", value)
}

/// Packet length with two decimals, or "-" when the backend had no data
pub fn format_length(value: Option<f64>) -> String {
  value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Integer with thousands separators
pub fn format_count(value: u64) -> String {
  let digits = value.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// "cached HH:MM:SS" for data served from the cache
pub fn cache_note(cached_at: Option<DateTime<Utc>>) -> Option<String> {
  cached_at.map(|at| format!("cached {}", at.with_timezone(&Local).format("%H:%M:%S")))
}

/// Block title reflecting the load state
pub fn load_title<T>(label: &str, state: &RequestState<T>, detail: Option<String>) -> String {
  match state {
    RequestState::Loading => format!(" {} (loading...) ", label),
    RequestState::Failed(e) => format!(" {} (error: {}) ", label, e.kind()),
    _ => match detail {
      Some(detail) => format!(" {} ({}) ", label, detail),
      None => format!(" {} ", label),
    },
  }
}

/// Body to show instead of data while loading or after a failure
pub fn placeholder<T>(state: &RequestState<T>) -> Option<Paragraph<'static>> {
  let paragraph = match state {
    RequestState::Success(_) => return None,
    RequestState::Idle => Paragraph::new(""),
    RequestState::Loading => Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
    RequestState::Failed(e) => Paragraph::new(vec![
      Line::styled(format!("Failed to load: {}", e), Style::default().fg(Color::Red)),
      Line::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray)),
    ]),
  };
  Some(paragraph.wrap(Wrap { trim: true }))
}
