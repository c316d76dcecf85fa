//! Terminal UI helpers: environment detection, styled output, prompts

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{intro, outro_success, step_info, step_warn};
pub use progress::spinner;
pub use prompts::confirm;
