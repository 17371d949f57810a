use crate::utils::error::{AppError, Result};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ORG_ID_VAR: &str = "OPENAI_ORG_ID";
pub const PROJECT_VAR: &str = "OPENAI_PROJECT";

/// 解析 `local.env` 內容：忽略空行與 `#` 註解，以第一個 `=` 分隔，去除引號
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            vars.insert(key.to_string(), value.to_string());
        }
    }

    vars
}

/// 檔案不存在時回傳空集合
pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashMap::new());
    }

    tracing::debug!("Loading environment overrides from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Ok(parse_env_file(&content))
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub organization: Option<String>,
    pub project: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .finish()
    }
}

impl Credentials {
    /// 依序查找：env 檔 → 行程環境變數 → 互動輸入（僅限 API key）
    pub fn resolve<E, P>(file_vars: &HashMap<String, String>, env: E, prompt: P) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        P: FnOnce() -> io::Result<String>,
    {
        let lookup = |name: &str| {
            file_vars
                .get(name)
                .cloned()
                .or_else(|| env(name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = match lookup(API_KEY_VAR) {
            Some(key) => key,
            None => {
                let entered = prompt()?.trim().to_string();
                if entered.is_empty() {
                    return Err(AppError::MissingConfigError {
                        field: format!("{} (No API key provided.)", API_KEY_VAR),
                    });
                }
                entered
            }
        };

        Ok(Self {
            api_key,
            organization: lookup(ORG_ID_VAR),
            project: lookup(PROJECT_VAR),
        })
    }

    /// 從 env 檔與行程環境取得憑證，必要時在終端機詢問 API key
    pub fn from_environment<P: AsRef<Path>>(env_file: P) -> Result<Self> {
        let file_vars = load_env_file(env_file)?;
        Self::resolve(&file_vars, |name| std::env::var(name).ok(), prompt_api_key)
    }
}

fn prompt_api_key() -> io::Result<String> {
    print!("Enter your OpenAI API Key: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
