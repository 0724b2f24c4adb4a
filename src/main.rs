use anyhow::{Context, Result};
use clap::Parser;

use solon_lookup::cli::{Cli, Commands};
use solon_lookup::utils::logging;
use solon_lookup::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（环境变量），再用命令行选项覆盖
    let mut config = Config::from_env().context("读取配置失败")?;
    cli.apply_to(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config)?;

    match &cli.command {
        Commands::Search { .. } => {
            let request = cli
                .command
                .search_request()
                .context("缺少查询参数")?;
            let outcome = app.search(request).await?;
            if !outcome.ok {
                std::process::exit(1);
            }
        }
        Commands::Batch { file, .. } => {
            app.run_batch(file)
                .await
                .with_context(|| format!("批量查询失败: {}", file.display()))?;
        }
    }

    Ok(())
}
