use clap::Parser;
use sora_imagegen_tool::adapters::preflight;
use sora_imagegen_tool::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "preflight")]
#[command(about = "Preflight checks: formatter check, auto-format, then lint")]
struct Args {
    /// Project root (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_console_logger(args.verbose);

    let root = match args.root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("❌ Cannot determine the current directory: {}", e);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = preflight::run_preflight(&root) {
        let code = match e {
            sora_imagegen_tool::AppError::PreflightError { code, .. } => code,
            _ => e.severity().exit_code(),
        };
        tracing::debug!("Preflight failed: {}", e);
        std::process::exit(code);
    }
}
