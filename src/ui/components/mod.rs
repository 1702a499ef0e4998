mod command_input;
mod key_result;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
