use std::process::ExitCode;

use clap::Parser;
use indicatif::MultiProgress;
use tracing::error;

use playlist_dl_lib::config::{AppConfig, Args};
use playlist_dl_lib::error::AppError;
use playlist_dl_lib::{logging, run, TROUBLESHOOTING_HINTS};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = AppConfig::from_args(&args);
    let progress = MultiProgress::new();
    let _guard = match logging::init(&config.log, &progress) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args, progress).await {
        Ok(summary) => {
            println!(
                "\nDownload finished: {} video(s) saved to '{}'",
                summary.titles.len(),
                summary.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e @ AppError::Interrupted) => {
            println!("\nDownload stopped by user");
            ExitCode::from(e.exit_code())
        }
        Err(AppError::MissingTool { tool, hint }) => {
            error!("Required tool not found: {}", tool);
            println!("\n{}\n", hint);
            println!("Install {} and run the program again.", tool);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            println!("\nTroubleshooting tips:");
            for (i, hint) in TROUBLESHOOTING_HINTS.iter().enumerate() {
                println!("{}. {}", i + 1, hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
