//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod clone_handlers;
mod improve_handlers;
mod speech_handlers;
mod transcribe_handlers;

pub use clone_handlers::*;
pub use improve_handlers::*;
pub use speech_handlers::*;
pub use transcribe_handlers::*;
