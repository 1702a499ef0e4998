pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{
  cache_note, format_count, format_length, format_percent, format_timestamp, harshness_color, load_title,
  placeholder, truncate,
};
