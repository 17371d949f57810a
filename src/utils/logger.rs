use crate::utils::error::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// 預設的執行日誌位置（相對於工作目錄）
pub const DEFAULT_LOG_FILE: &str = "story-to-video/run.log";

/// 以附加模式開啟日誌檔，必要時建立上層目錄
pub fn open_log_file<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// 日誌檔每行的格式：`時間 - LEVEL - 訊息`
pub struct FileLineFormat;

impl<S, N> FormatEvent<S, N> for FileLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format(FILE_TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// 寫入日誌檔的 layer，固定記錄 DEBUG 以上
pub fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .event_format(FileLineFormat)
        .with_filter(LevelFilter::DEBUG)
}

fn console_filter(quiet: bool, verbose: bool) -> EnvFilter {
    let default = match (quiet, verbose) {
        (true, _) => "info",
        (false, true) => "debug",
        (false, false) => "sora_imagegen_tool=debug,story_to_video=debug,info",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 主控台只輸出訊息本身；日誌檔固定記錄 DEBUG 以上並附時間戳
pub fn init_cli_logger(quiet: bool, verbose: bool, log_file: &Path) -> Result<()> {
    let file = open_log_file(log_file)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_level(false)
        .compact()
        .with_filter(console_filter(quiet, verbose));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer(file))
        .try_init()
        .map_err(|e| crate::utils::error::AppError::ConfigError {
            message: format!("Failed to install logger: {}", e),
        })?;

    Ok(())
}

/// 不寫檔的簡易主控台日誌（preflight 等輔助工具使用）
pub fn init_console_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sora_imagegen_tool=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sora_imagegen_tool=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
