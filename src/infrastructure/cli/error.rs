//! CLI Error Handling

use std::path::PathBuf;
use thiserror::Error;

use crate::application::{ApplicationError, ProviderError};

/// 退出码定义
pub mod exit_code {
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 3;
    pub const PROVIDER: i32 = 4;
    /// 远端克隆音色可能残留
    pub const CLEANUP: i32 = 5;
    pub const INTERNAL: i32 = 70;
}

/// CLI 错误
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("Failed to initialize provider: {0}")]
    ProviderInit(#[source] ProviderError),

    #[error("Failed to initialize speech improver: {0}")]
    ImproverInit(#[source] ProviderError),

    #[error("Provider is unreachable")]
    ProviderUnreachable,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Application(err) => match err {
                ApplicationError::ValidationError(_) => exit_code::VALIDATION,
                ApplicationError::ProviderError { .. } => exit_code::PROVIDER,
                ApplicationError::CleanupError { .. }
                | ApplicationError::CompositeError { .. }
                | ApplicationError::VoiceCreationUnconfirmed { .. } => exit_code::CLEANUP,
                ApplicationError::InternalError(_) => exit_code::INTERNAL,
            },
            CliError::ProviderInit(_) | CliError::ImproverInit(_) | CliError::ProviderUnreachable => {
                exit_code::PROVIDER
            }
            CliError::Io { .. } => exit_code::IO,
            CliError::Render(_) => exit_code::INTERNAL,
        }
    }

    /// 输出错误日志，远端音色残留时额外告警
    pub fn report(&self) {
        match self {
            CliError::Application(err) if err.leaks_remote_voice() => {
                tracing::error!(
                    exit_code = self.exit_code(),
                    error = %err,
                    "Cloned voice may still exist at the provider; delete it manually"
                );
            }
            CliError::Application(ApplicationError::ValidationError(msg)) => {
                tracing::warn!(exit_code = self.exit_code(), error = %msg, "Invalid input");
            }
            _ => {
                tracing::error!(exit_code = self.exit_code(), error = %self, "Command failed");
            }
        }
    }
}
