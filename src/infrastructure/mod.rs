//! Infrastructure Layer - 基础设施层
//!
//! 提供端口的具体实现与命令行入口

pub mod adapters;
pub mod cli;

pub use adapters::{ElevenLabsClient, FakeSpeechProvider};
pub use cli::{AppState, Cli, CliError};
