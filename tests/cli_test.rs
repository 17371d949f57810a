use std::process::Command;

#[test]
fn test_cli_prints_custom_greeting() {
    let output = Command::new(env!("CARGO_BIN_EXE_sora_imagegen_tool"))
        .args(["--name", "Atlas"])
        .output()
        .expect("failed to run greeting binary");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Hello, Atlas!");
}

#[test]
fn test_cli_default_greeting() {
    let output = Command::new(env!("CARGO_BIN_EXE_sora_imagegen_tool"))
        .output()
        .expect("failed to run greeting binary");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Hello, world!");
}

#[test]
fn test_story_to_video_requires_story_and_style() {
    let output = Command::new(env!("CARGO_BIN_EXE_story_to_video"))
        .output()
        .expect("failed to run story_to_video binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--story"));
}

#[test]
fn test_story_to_video_dry_run_lists_scenes() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("prompts.json"),
        r#"[{"index": 1, "title": "Opening", "narrative_role": "setup", "prompt_text": "a misty valley"}]"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_story_to_video"))
        .current_dir(temp_dir.path())
        .args([
            "--story",
            "A shepherd's journey",
            "--style",
            "woodcut",
            "--dry-run",
            "--no-preflight",
            "--quiet",
        ])
        .output()
        .expect("failed to run story_to_video binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("1 scene(s) would be rendered"));
    assert!(stdout.contains("Opening (setup)"));
    assert!(temp_dir.path().join("frames").is_dir());

    let log = std::fs::read_to_string(temp_dir.path().join("story-to-video").join("run.log")).unwrap();
    let story_line = log
        .lines()
        .find(|line| line.contains("Story:"))
        .expect("story line in run.log");
    assert!(story_line.ends_with(" - INFO - 📖 Story: A shepherd's journey"));
    assert!(log.lines().all(|line| line.contains(" - ")));
}
