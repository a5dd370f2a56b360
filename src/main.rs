use anyhow::Context;
use clap::Parser;
use giri_board::utils::error::ErrorSeverity;
use giri_board::utils::{logger, validation::Validate};
use giri_board::{
    notification_channels, spawn_board, spawn_frame_reader, BoardConfig, BoardError, CliConfig,
    HttpBackend, SerialPortLink,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 初始化日誌
    logger::init_logger(config.logging.format, config.logging.verbose);

    tracing::info!("Starting giri-board");
    if config.logging.verbose {
        tracing::debug!("Board config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("✅ Scoreboard stopped cleanly");
            Ok(())
        }
        Err(e) => match e.downcast_ref::<BoardError>() {
            Some(board_error) => exit_with(board_error),
            None => Err(e),
        },
    }
}

async fn run(config: BoardConfig) -> anyhow::Result<()> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let link = SerialPortLink::open(&config.serial)?;

    let (bus, mut ui) = notification_channels();
    let (board, board_task) = spawn_board(backend, &config.backend, bus);
    let mut reader = spawn_frame_reader(link, &config.serial, &config.modem, board.clone());

    // 沒有圖形介面時，直接把顯示事件印到終端機
    let outcome = loop {
        tokio::select! {
            Some(text) = ui.timer.recv() => println!("⏱️  {}", text),
            Some(count) = ui.counter.recv() => println!("🔢 {}", count),
            Some(visible) = ui.visibility.recv() => println!("👁️  {}", u8::from(visible)),
            Some(name) = ui.name.recv() => println!("🏋️ {}", name),
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                tracing::info!("Received Ctrl-C, shutting down");
                break Ok(());
            }
            joined = &mut reader => break joined.context("frame reader panicked")?,
        }
    };

    match board.snapshot().await.and_then(|snapshot| snapshot.to_json()) {
        Ok(state) => tracing::info!("📊 Final board state: {}", state),
        Err(e) => tracing::debug!("No final board state: {}", e),
    }
    if board.shutdown().await.is_err() {
        tracing::debug!("Board already stopped");
    }
    board_task.await.context("board task panicked")?;

    Ok(outcome?)
}

fn exit_with(e: &BoardError) -> ! {
    tracing::error!(
        "❌ Scoreboard failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
