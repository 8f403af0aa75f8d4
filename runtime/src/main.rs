//! 命令行入口

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ptgen::models::Site;
use ptgen::{GenConfig, Pipeline};
use ptgen_runtime::{GenOutput, HttpFetcher, RouteError, RuntimeConfig, route};

/// 生成影视 / 游戏资源的 BBCode 简介
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 资源链接, 或 `url=` / `site=&sid=` 形式的查询串
    input: Option<String>,
    /// 站点 (douban, imdb, bangumi, steam, indienova, epic)
    #[arg(long, requires = "sid", conflicts_with = "input")]
    site: Option<String>,
    /// 站点内 id
    #[arg(long, requires = "site")]
    sid: Option<String>,
    /// YAML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 输出完整 JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn target(&self, config: &GenConfig) -> std::result::Result<(Site, String), RouteError> {
        match (&self.input, &self.site, &self.sid) {
            (_, Some(site), Some(sid)) => route(config, &format!("site={site}&sid={sid}")),
            (Some(input), _, _) => match config.select_site(input) {
                Some(target) => Ok(target),
                None => route(config, input),
            },
            _ => Err(RouteError::MissingKey),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let runtime = match &cli.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let config = runtime.gen_config();
    let fetcher = HttpFetcher::new(&runtime.user_agent, runtime.timeout())
        .context("failed to build http client")?;

    let output = match cli.target(&config) {
        Ok((site, sid)) => {
            let record = Pipeline::new(&config, &fetcher).extract(site, &sid).await;
            GenOutput::new(record, &runtime.author)
        }
        Err(e) => {
            tracing::warn!(error = %e, "request rejected");
            GenOutput::rejected(e, &runtime.author)
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match output.record() {
            Some(record) if record.is_success() => println!("{}", record.format()),
            _ => anyhow::bail!("{}", output.error().unwrap_or_default()),
        }
    }

    Ok(())
}
