use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::models::SearchRequest;

#[derive(Parser, Debug)]
#[command(name = "solon_lookup")]
#[command(about = "SOLON 公开案件查询：按 Γ.Α.Κ. 编号查找判决", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 显示浏览器窗口（默认无头运行）
    #[arg(long, global = true)]
    pub headed: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 查询一个案件
    Search {
        /// 法院名称（自由文本，如 "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ"）
        #[arg(long)]
        court: String,

        /// Γ.Α.Κ. 编号
        #[arg(long)]
        number: String,

        /// Γ.Α.Κ. 年份
        #[arg(long)]
        year: String,

        /// 客户名称（仅用于显示）
        #[arg(long, default_value = "")]
        client: String,
    },

    /// 从 TOML 或 Excel 文件批量查询
    Batch {
        /// 请求文件：`.xlsx`/`.xls`/`.ods` 工作簿，或带 `[[requests]]` 表的 TOML
        #[arg(required = true)]
        file: PathBuf,

        /// 并发浏览器数量（覆盖 BATCH_WORKERS）
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

impl Cli {
    /// 把命令行选项覆盖到配置上
    pub fn apply_to(&self, config: &mut Config) {
        if self.verbose {
            config.verbose_logging = true;
        }
        if self.headed {
            config.headless = false;
        }
        if let Commands::Batch {
            workers: Some(workers),
            ..
        } = &self.command
        {
            config.batch_workers = (*workers).max(1);
        }
    }
}

impl Commands {
    /// 单次查询的请求
    pub fn search_request(&self) -> Option<SearchRequest> {
        match self {
            Commands::Search {
                court,
                number,
                year,
                client,
            } => Some(SearchRequest::new(court.as_str(), number.as_str(), year.as_str()).with_client(client.as_str())),
            Commands::Batch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "solon_lookup",
            "search",
            "--court",
            "ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ",
            "--number",
            "70927",
            "--year",
            "2025",
        ])
        .unwrap();
        let request = cli.command.search_request().unwrap();
        assert_eq!(request.case_label(), "70927/2025");
        assert_eq!(request.client, "");
    }

    #[test]
    fn test_batch_overrides_config() {
        let cli = Cli::try_parse_from([
            "solon_lookup",
            "--headed",
            "batch",
            "input.toml",
            "--workers",
            "0",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert!(!config.headless);
        assert_eq!(config.batch_workers, 1);
        assert!(cli.command.search_request().is_none());
    }
}
