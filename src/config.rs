use crate::section::Section;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE: &str = "skillmark.json";
pub const BANK_DIR_ENV: &str = "SKILLMARK_BANK_DIR";
const DEFAULT_BANK_DIR: &str = "banks";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    bank_dir: Option<String>,
    bank_files: BTreeMap<String, String>,
}

/// Where a workspace keeps its question banks.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub bank_dir: PathBuf,
    bank_files: BTreeMap<Section, String>,
}

impl WorkspaceConfig {
    pub fn defaults(workspace: &Path) -> Self {
        WorkspaceConfig {
            bank_dir: workspace.join(DEFAULT_BANK_DIR),
            bank_files: Section::ALL
                .into_iter()
                .map(|s| (s, s.default_bank_file().to_string()))
                .collect(),
        }
    }

    /// Reads `skillmark.json` when present, then applies `SKILLMARK_BANK_DIR`.
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        let contents = if path.is_file() {
            Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.to_string_lossy()))?,
            )
        } else {
            None
        };
        Self::from_parts(
            workspace,
            contents.as_deref(),
            std::env::var(BANK_DIR_ENV).ok(),
        )
    }

    fn from_parts(
        workspace: &Path,
        contents: Option<&str>,
        env_bank_dir: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut cfg = Self::defaults(workspace);
        let file: ConfigFile = match contents {
            Some(text) => serde_json::from_str(text)
                .with_context(|| format!("invalid {}", CONFIG_FILE))?,
            None => ConfigFile::default(),
        };

        for (name, file_name) in file.bank_files {
            match Section::from_name(&name) {
                Some(section) => {
                    cfg.bank_files.insert(section, file_name);
                }
                None => warn!(section = %name, "ignoring bank file for unknown section"),
            }
        }

        let bank_dir = env_bank_dir
            .filter(|d| !d.trim().is_empty())
            .or(file.bank_dir);
        if let Some(dir) = bank_dir {
            cfg.bank_dir = workspace.join(dir);
        }
        Ok(cfg)
    }

    pub fn bank_path(&self, section: Section) -> PathBuf {
        let file_name = self
            .bank_files
            .get(&section)
            .map(String::as_str)
            .unwrap_or_else(|| section.default_bank_file());
        self.bank_dir.join(file_name)
    }
}
