//! CLI - 命令行入口适配器
//!
//! 子命令：
//! - `transcribe` 转写音频文件
//! - `speak` 使用已有音色合成语音
//! - `clone` 临时克隆音色、合成并删除音色
//! - `improve` 转写、改写讲稿，再用本人克隆音色朗读
//! - `check` 检查 provider 连通性

mod error;
mod state;

pub use error::{exit_code, CliError};
pub use state::AppState;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::application::{
    CheckProviderHealth, CloneAndSpeak, ImproveSpeech, SynthesizeSpeech, TranscribeAudio,
};

/// 语音转写、合成与临时音色克隆
#[derive(Parser, Debug)]
#[command(name = "voxrelay", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// 配置文件路径（默认搜索 voxrelay.toml / voxrelay.local.toml）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 启动时打印生效的配置
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transcribe an audio file to text.
    Transcribe {
        /// Audio file to transcribe.
        audio: PathBuf,

        /// Language hint (e.g. "en"); blank means auto-detect.
        #[arg(short, long)]
        language: Option<String>,

        /// Annotate speakers.
        #[arg(long, conflicts_with = "no_diarize")]
        diarize: bool,

        /// Do not annotate speakers, even if the config enables it.
        #[arg(long)]
        no_diarize: bool,

        /// Annotate non-speech audio events.
        #[arg(long, conflicts_with = "no_tag_audio_events")]
        tag_audio_events: bool,

        /// Do not annotate audio events, even if the config enables it.
        #[arg(long)]
        no_tag_audio_events: bool,

        /// Print the full transcript as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Synthesize speech with an existing voice.
    Speak {
        /// Provider voice ID.
        #[arg(long)]
        voice_id: String,

        /// Text to speak.
        #[arg(short, long)]
        text: String,

        /// Language hint; blank means provider default.
        #[arg(short, long)]
        language: Option<String>,

        /// Output audio file.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Clone a voice from a sample, speak the text with it, then delete the voice.
    Clone {
        /// Reference voice sample.
        #[arg(short, long)]
        sample: PathBuf,

        /// Text to speak.
        #[arg(short, long)]
        text: String,

        /// Name for the temporary voice.
        #[arg(short, long)]
        name: Option<String>,

        /// Language hint; blank means provider default.
        #[arg(short, long)]
        language: Option<String>,

        /// Output audio file.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe a recording, rewrite it, and read the result back in the speaker's cloned voice.
    Improve {
        /// Recording of the speech; also used as the voice sample.
        audio: PathBuf,

        /// What the rewrite should focus on (e.g. "clarity").
        #[arg(short, long)]
        focus: Option<String>,

        /// Name for the temporary voice.
        #[arg(short, long)]
        name: Option<String>,

        /// Language hint; blank means auto-detect.
        #[arg(short, long)]
        language: Option<String>,

        /// Output audio file.
        #[arg(short, long)]
        output: PathBuf,

        /// Print transcript and improvement as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that the provider is reachable with the configured credentials.
    Check,
}

/// 执行子命令
pub async fn run(command: Command, state: &AppState) -> Result<(), CliError> {
    match command {
        Command::Transcribe {
            audio,
            language,
            diarize,
            no_diarize,
            tag_audio_events,
            no_tag_audio_events,
            json,
        } => {
            let data = read_file(&audio).await?;
            let transcript = state
                .transcribe_handler
                .handle(TranscribeAudio {
                    audio: data,
                    file_name: file_name_of(&audio),
                    language,
                    diarize: toggle(diarize, no_diarize),
                    tag_audio_events: toggle(tag_audio_events, no_tag_audio_events),
                })
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&transcript)?);
            } else {
                println!("{}", transcript.text);
            }
        }

        Command::Speak {
            voice_id,
            text,
            language,
            output,
        } => {
            let result = state
                .synthesize_handler
                .handle(SynthesizeSpeech {
                    voice_id,
                    text,
                    language,
                })
                .await?;

            write_file(&output, &result.audio_data).await?;
            tracing::info!(
                output = %output.display(),
                content_type = %result.content_type,
                "Audio written"
            );
        }

        Command::Clone {
            sample,
            text,
            name,
            language,
            output,
        } => {
            let data = read_file(&sample).await?;
            let response = state
                .clone_and_speak_handler
                .handle(CloneAndSpeak {
                    audio: data,
                    file_name: file_name_of(&sample),
                    voice_name: name,
                    text,
                    language,
                })
                .await?;

            write_file(&output, &response.audio.audio_data).await?;
            tracing::info!(
                workflow_id = %response.workflow_id,
                voice_name = %response.voice_name,
                final_state = %response.final_state,
                output = %output.display(),
                "Audio written"
            );
        }

        Command::Improve {
            audio,
            focus,
            name,
            language,
            output,
            json,
        } => {
            let data = read_file(&audio).await?;
            let response = state
                .improve_handler
                .handle(ImproveSpeech {
                    audio: data,
                    file_name: file_name_of(&audio),
                    language,
                    focus,
                    voice_name: name,
                    ..Default::default()
                })
                .await?;

            write_file(&output, &response.clone.audio.audio_data).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response.summary())?);
            } else {
                println!("{}", response.spoken_text());
                if let Some(improvement) = &response.improvement {
                    for suggestion in &improvement.suggestions {
                        println!("- {}", suggestion);
                    }
                }
            }
            tracing::info!(
                workflow_id = %response.clone.workflow_id,
                improved = response.improvement.is_some(),
                output = %output.display(),
                "Audio written"
            );
        }

        Command::Check => {
            let health = state.health_handler.handle(CheckProviderHealth).await;
            if !health.reachable {
                return Err(CliError::ProviderUnreachable);
            }
            println!("provider reachable");
        }
    }

    Ok(())
}

/// `--x` / `--no-x` 开关；都未指定时沿用配置
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CliError::io(path, e))
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CliError::io(parent, e))?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| CliError::io(path, e))
}
