use indicatif::{ProgressBar, ProgressStyle};

/// 排隊與生成兩階段共用的進度條
pub struct SceneProgress {
    progress_bar: ProgressBar,
}

impl SceneProgress {
    pub fn new(total: usize, desc: &str, unit: &str, visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };

        let template = format!(
            "{{msg}}: {{percent:>3}}%|{{bar:30.cyan/blue}}| {{pos}}/{{len}} [{{elapsed_precise}}] {}",
            unit
        );
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            pb.set_style(style.progress_chars("█▉ "));
        }
        pb.set_message(desc.to_string());

        Self { progress_bar: pb }
    }

    pub fn inc(&self) {
        self.progress_bar.inc(1);
    }

    pub fn finish(&self) {
        self.progress_bar.finish();
    }

    pub fn abandon(&self) {
        self.progress_bar.abandon();
    }
}
