//! 应用层 - 命令
//!
//! 所有会调用外部 provider 的操作

mod clone_commands;
mod improve_commands;
mod speech_commands;
mod transcribe_commands;

pub mod handlers;

pub use clone_commands::*;
pub use improve_commands::*;
pub use speech_commands::*;
pub use transcribe_commands::*;
