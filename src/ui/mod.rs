pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::widgets::TableState;

/// Keep a table selection inside `len` rows, selecting the first row when
/// there is data and nothing is selected
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamped_to_rows() {
    let mut state = TableState::default().with_selected(Some(12));
    ensure_valid_selection(&mut state, 10);
    assert_eq!(state.selected(), Some(9));
  }

  #[test]
  fn test_selection_cleared_without_rows() {
    let mut state = TableState::default().with_selected(Some(3));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_first_row_selected_by_default() {
    let mut state = TableState::default();
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(0));
  }
}
