// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{bail, Context, Result};
use clap::Parser;
use imgaudit::config::settings::{LogFormat, Settings};
use imgaudit::domain::services::page_analyzer::PageAnalyzer;
use imgaudit::domain::services::result_sink::ResultSink;
use imgaudit::domain::services::url_provider::UrlProvider;
use imgaudit::engines::chromium_renderer::ChromiumRenderer;
use imgaudit::engines::image_fetcher::ImageFetcher;
use imgaudit::engines::render_limiter::{LimitedRenderer, RenderLimiter};
use imgaudit::infrastructure::metrics;
use imgaudit::infrastructure::services::result_sink_impl::{FileResultSink, WebhookResultSink};
use imgaudit::infrastructure::services::url_provider_impl::{HttpUrlProvider, StaticUrlProvider};
use imgaudit::utils::telemetry;
use imgaudit::workers::CrawlOrchestrator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "imgaudit", version, about = "Audit the images of rendered web pages")]
struct Cli {
    /// Extra configuration file, layered over config/default
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page to audit instead of asking the URL provider (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// File with one page URL per line
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Write results to a JSON file instead of the webhook
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

/// 主函数
///
/// 加载配置，组装渲染器、分析器、提供方与投递方，执行一次审计运行
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Settings::new().context("failed to load configuration")?,
    };
    if cli.json_logs {
        settings.telemetry.format = LogFormat::Json;
    }
    settings.validate()?;

    // 2. Logging and metrics
    telemetry::init_telemetry(settings.telemetry.format);
    metrics::init_metrics(&settings.metrics);
    info!("Starting imgaudit...");

    // 3. Renderer behind the global render limiter
    let renderer = Arc::new(ChromiumRenderer::new(settings.render.clone()));
    let limiter = RenderLimiter::new(settings.crawl.concurrency_limit);
    let renderer = Arc::new(LimitedRenderer::new(renderer, limiter));
    info!(
        concurrency_limit = settings.crawl.concurrency_limit,
        "Render limiter initialized"
    );

    // 4. Page analyzer
    let fetcher =
        ImageFetcher::new(settings.image.clone()).context("failed to build image HTTP client")?;
    let analyzer = Arc::new(PageAnalyzer::new(renderer, fetcher, &settings.image));

    // 5. Provider and sink
    let provider = build_provider(&cli, &settings)?;
    let sink = build_sink(&cli, &settings)?;
    info!(destination = %sink.destination(), "Result sink configured");

    let orchestrator = CrawlOrchestrator::new(
        provider,
        sink,
        analyzer,
        settings.crawl.clone(),
        settings.sink.clone(),
    );

    let summary = orchestrator.run().await?;
    info!(
        run_id = %summary.run_id,
        batches = summary.batches.len(),
        pages = summary.verdicts.len(),
        delivered = summary.delivered,
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Audit run completed"
    );
    Ok(())
}

fn build_provider(cli: &Cli, settings: &Settings) -> Result<Arc<dyn UrlProvider>> {
    if cli.urls.is_empty() && cli.urls_file.is_none() {
        return match HttpUrlProvider::from_settings(&settings.provider) {
            Some(provider) => Ok(Arc::new(provider)),
            None => bail!("no URL source: set provider.url or pass --url / --urls-file"),
        };
    }

    let mut provider = match &cli.urls_file {
        Some(path) => StaticUrlProvider::from_file(path)?,
        None => StaticUrlProvider::default(),
    };
    provider.extend(cli.urls.iter().cloned());
    Ok(Arc::new(provider))
}

fn build_sink(cli: &Cli, settings: &Settings) -> Result<Arc<dyn ResultSink>> {
    let envelope = settings.sink.envelope_type.clone();

    if let Some(path) = cli
        .output
        .clone()
        .or_else(|| settings.sink.output_path.as_ref().map(PathBuf::from))
    {
        return Ok(Arc::new(FileResultSink::new(path, envelope)));
    }

    match WebhookResultSink::from_settings(&settings.sink) {
        Some(sink) => Ok(Arc::new(sink)),
        None => bail!("no result destination: set sink.url, sink.output_path or pass --output"),
    }
}
