//! 生成前的程式碼檢查：格式檢查 → 自動格式化 → lint 修正

use crate::utils::error::{AppError, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 需要檢查的路徑（相對於專案根目錄）
pub const REQUESTED_PATHS: [&str; 2] = ["src", "tests"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightStep {
    pub description: String,
    pub program: String,
    pub args: Vec<String>,
    /// 結束碼 1 且 stdout 有 diff 時只顯示差異並繼續
    pub reports_diff: bool,
}

impl PreflightStep {
    fn cargo(description: &str, args: &[&str]) -> Self {
        Self {
            description: description.to_string(),
            program: "cargo".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            reports_diff: false,
        }
    }

    fn reporting_diff(mut self) -> Self {
        self.reports_diff = true;
        self
    }
}

/// 依序執行的檢查步驟
pub fn default_steps() -> Vec<PreflightStep> {
    vec![
        PreflightStep::cargo("Formatter dry-run (diff)", &["fmt", "--all", "--", "--check"])
            .reporting_diff(),
        PreflightStep::cargo("Formatter auto-format", &["fmt", "--all"]),
        PreflightStep::cargo(
            "Linter",
            &[
                "clippy",
                "--all-targets",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
            ],
        ),
    ]
}

/// 找出實際存在的檢查路徑；缺少的路徑只會警告
pub fn existing_paths(root: &Path) -> Result<Vec<PathBuf>> {
    let mut existing = Vec::new();
    for path in REQUESTED_PATHS {
        if root.join(path).exists() {
            existing.push(PathBuf::from(path));
        } else {
            println!("{}", format!("⚠ Skipping missing path: {}", path).yellow());
        }
    }

    if existing.is_empty() {
        println!("{}", "✘ No valid paths to check. Aborting preflight.".red());
        return Err(AppError::PreflightError {
            step: "path discovery".to_string(),
            code: 1,
        });
    }

    Ok(existing)
}

fn run_step(step: &PreflightStep, root: &Path) -> Result<()> {
    println!("{} {}...", "[PRE-FLIGHT]".blue(), step.description);
    tracing::debug!("Running {} {}", step.program, step.args.join(" "));

    let output = Command::new(&step.program)
        .args(&step.args)
        .current_dir(root)
        .output()?;

    if output.status.success() {
        println!("{}", format!("✔ {} OK", step.description).green());
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // rustfmt --check 以結束碼 1 表示有差異；解析失敗時 stdout 沒有 diff
    if step.reports_diff && output.status.code() == Some(1) && !stdout.trim().is_empty() {
        println!("{}", stdout);
        println!(
            "{}",
            format!("⚠ {} found changes; continuing", step.description).yellow()
        );
        return Ok(());
    }

    println!("{}", format!("✘ {} failed. Aborting.", step.description).red());
    if !stdout.trim().is_empty() {
        println!("{}", stdout);
    }
    if !stderr.trim().is_empty() {
        println!("{}", stderr);
    }

    Err(AppError::PreflightError {
        step: step.description.clone(),
        code: output.status.code().unwrap_or(1),
    })
}

/// 在 `root` 依序執行所有步驟，第一個失敗即中止
///
/// `REQUESTED_PATHS` 只是執行前提；`cargo fmt --all` 與 clippy 處理的是整個 workspace。
pub fn run_steps(root: &Path, steps: &[PreflightStep]) -> Result<()> {
    existing_paths(root)?;

    for step in steps {
        run_step(step, root)?;
    }

    println!("\n{}", "✅ All preflight checks passed!".green());
    Ok(())
}

pub fn run_preflight(root: &Path) -> Result<()> {
    run_steps(root, &default_steps())
}

/// `story_to_video` 啟動時呼叫；不在 Cargo 專案內時略過
pub fn run_if_available(root: &Path) -> Result<()> {
    if !root.join("Cargo.toml").exists() {
        tracing::warn!("No Cargo.toml in {}. Skipping pre-flight checks.", root.display());
        return Ok(());
    }

    tracing::info!("Running pre-flight checks (formatter and linter)…");
    run_preflight(root)
}
