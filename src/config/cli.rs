use crate::config::{lambda, toml_config, IntakeConfig};
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[command(name = "onboarding-intake")]
#[command(about = "Forward onboarding form submissions into Airtable")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Airtable token (defaults to $AIRTABLE_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 送出一份表單 JSON 檔
    Submit {
        #[arg(long)]
        payload: PathBuf,

        #[arg(long, help = "Read from Airtable but keep writes local")]
        dry_run: bool,
    },
    /// 印出由產品資料表建立的分類對照
    Categories {
        #[arg(long, help = "Category -> products without subcategories")]
        flat: bool,
    },
}

impl CliConfig {
    /// 合併設定檔、環境變數與命令列參數
    pub fn resolve(&self) -> Result<IntakeConfig> {
        match &self.config {
            Some(path) => {
                let mut config = toml_config::from_file(path)?;
                if let Some(token) = &self.token {
                    config.airtable.token = token.clone();
                }
                Ok(config)
            }
            None => lambda::from_lookup(|key| {
                if key == lambda::TOKEN_VAR {
                    if let Some(token) = &self.token {
                        return Some(token.clone());
                    }
                }
                std::env::var(key).ok()
            }),
        }
    }
}
