//! Voxrelay - 语音转写、合成与临时音色克隆
//!
//! 启动流程：解析参数 → 加载配置 → 初始化日志 → 组装 provider 与 handlers → 执行子命令

use clap::Parser;

use voxrelay::config::{load_config_from_path, print_config, AppConfig};
use voxrelay::infrastructure::cli::{self, AppState, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    if args.verbose {
        print_config(&config);
    }

    let state = AppState::from_config(&config)?;

    // 克隆流程收到中断后仍需等待远端音色删除完成
    let command = cli::run(args.command, &state);
    tokio::pin!(command);
    let result = tokio::select! {
        result = &mut command => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, waiting for in-flight provider cleanup");
            command.await
        }
    };

    if let Err(e) = result {
        e.report();
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// 初始化日志，日志输出到 stderr，stdout 只留给命令结果
fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},voxrelay={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
