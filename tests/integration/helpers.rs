// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use imgaudit::config::settings::{CrawlSettings, ImageSettings, SinkSettings};
use imgaudit::domain::models::PageRecord;
use imgaudit::domain::services::page_analyzer::PageAnalyzer;
use imgaudit::domain::services::result_sink::ResultSink;
use imgaudit::engines::image_fetcher::ImageFetcher;
use imgaudit::engines::render_limiter::{LimitedRenderer, RenderLimiter};
use imgaudit::engines::traits::{PageRenderer, RenderError};
use imgaudit::infrastructure::services::url_provider_impl::StaticUrlProvider;
use imgaudit::utils::errors::AuditError;
use imgaudit::workers::CrawlOrchestrator;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 记录并发峰值的假渲染器
///
/// URL包含 `fail` 时返回导航错误，包含 `slow` 时长时间挂起，
/// 其余返回 `html_for` 中的内容或一个没有图片的页面。
#[derive(Default)]
pub struct FakeRenderer {
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
    pub pages: HashMap<String, String>,
}

impl FakeRenderer {
    pub fn with_pages(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = if url.contains("slow") {
            Duration::from_secs(3600)
        } else {
            Duration::from_millis(20)
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("fail") {
            return Err(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body><h1>product</h1></body></html>".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 记录每次投递的结果投递
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<Vec<PageRecord>>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }

    pub fn last(&self) -> Option<Vec<PageRecord>> {
        self.deliveries.lock().last().cloned()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn deliver(&self, records: &[PageRecord]) -> Result<(), AuditError> {
        self.deliveries.lock().push(records.to_vec());
        if self.fail {
            return Err(AuditError::Delivery("sink unavailable".to_string()));
        }
        Ok(())
    }

    fn destination(&self) -> String {
        "memory".to_string()
    }
}

pub fn page_urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://shop.example.com/p/{}", i))
        .collect()
}

/// 组装编排器：假渲染器外包一层限流器，与生产环境的组装方式一致
pub fn orchestrator(
    urls: Vec<String>,
    renderer: Arc<FakeRenderer>,
    sink: Arc<RecordingSink>,
    crawl: CrawlSettings,
    sink_settings: SinkSettings,
    image: ImageSettings,
) -> CrawlOrchestrator {
    let limited = Arc::new(LimitedRenderer::new(
        renderer,
        RenderLimiter::new(crawl.concurrency_limit),
    ));
    let fetcher = ImageFetcher::new(image.clone()).expect("image client");
    let analyzer = Arc::new(PageAnalyzer::new(limited, fetcher, &image));

    CrawlOrchestrator::new(
        Arc::new(StaticUrlProvider::new(urls)),
        sink,
        analyzer,
        crawl,
        sink_settings,
    )
}
