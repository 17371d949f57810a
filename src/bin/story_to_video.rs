use clap::Parser;
use sora_imagegen_tool::adapters::preflight;
use sora_imagegen_tool::core::StoryPipeline;
use sora_imagegen_tool::utils::error::AppError;
use sora_imagegen_tool::utils::monitor::RunMonitor;
use sora_imagegen_tool::utils::{logger, validation::Validate};
use sora_imagegen_tool::{
    Credentials, FfmpegEncoder, LocalStorage, OpenAiImageClient, RenderEngine, RenderPipeline,
    StoryArgs, ToolSettings,
};
use std::sync::Arc;

/// 依錯誤嚴重程度輸出訊息並結束
fn exit_with(e: &AppError) -> ! {
    tracing::error!(
        "❌ Story render failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code().max(1));
}

#[tokio::main]
async fn main() {
    let args = StoryArgs::parse();

    // 設定檔決定日誌位置，必須在初始化日誌前載入
    let settings = match ToolSettings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load settings: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = logger::init_cli_logger(args.quiet, args.verbose, &settings.logging.file) {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code().max(1));
    }

    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Tool settings: {:?}", settings);

    if let Err(e) = args.validate().and_then(|_| settings.validate()) {
        exit_with(&e);
    }

    if !args.no_preflight {
        let root = std::env::current_dir().unwrap_or_else(|_| ".".into());
        if let Err(e) = preflight::run_if_available(&root) {
            tracing::error!("Pre-flight checks failed. Fix issues and re-run.");
            exit_with(&e);
        }
    }

    let credentials = if args.dry_run {
        // dry-run 不呼叫 API，不需要真正的金鑰
        Credentials {
            api_key: String::new(),
            organization: None,
            project: None,
        }
    } else {
        match Credentials::from_environment(&settings.credentials.env_file) {
            Ok(credentials) => credentials,
            Err(e) => exit_with(&e),
        }
    };

    let generator = match OpenAiImageClient::new(&settings.api, credentials) {
        Ok(generator) => generator,
        Err(e) => exit_with(&e),
    };

    tracing::info!("📖 Story: {}", args.story);
    tracing::info!("🎨 Style: {}", args.style);

    let monitor = Arc::new(RunMonitor::new(args.monitor));
    if monitor.is_system_stats_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let smoke_test = args.smoke_test;
    let dry_run = args.dry_run;
    let pipeline = RenderPipeline::new(
        generator,
        LocalStorage::new("."),
        FfmpegEncoder::new(settings.video.clone()),
        args,
    )
    .with_retry_policy(settings.retry_policy())
    .with_monitor(Arc::clone(&monitor));

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No images will be generated");
        let scenes = match pipeline.extract().await {
            Ok(scenes) => scenes,
            Err(e) => exit_with(&e),
        };
        println!("📋 {} scene(s) would be rendered:", scenes.len());
        for preview in pipeline.preview(&scenes).await {
            println!(
                "  {:>3}. {} ({}) -> {}{}",
                preview.scene.index,
                preview.scene.title,
                preview.scene.narrative_role,
                preview.frame_path.display(),
                if preview.reuse { " [reuse]" } else { "" }
            );
        }
        return;
    }

    if smoke_test {
        if let Err(e) = pipeline.smoke_test().await {
            exit_with(&e);
        }
    }

    let engine = RenderEngine::new_with_monitor(pipeline, monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Story render completed successfully!");
            println!("✅ Video written to {}", output_path.display());
        }
        Err(e) => exit_with(&e),
    }
}
