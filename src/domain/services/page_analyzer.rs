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

use crate::config::settings::ImageSettings;
use crate::domain::models::{
    FailureReason, FetchOutcome, ImageSample, PageFailure, PageOutcome, PageTarget,
    PageVerdict, QualityReport,
};
use crate::domain::services::duplicate_detector::DuplicateDetector;
use crate::domain::services::image_classifier::ImageClassifier;
use crate::domain::services::image_extractor::PageImageExtractor;
use crate::engines::image_fetcher::{FetchError, ImageFetcher};
use crate::engines::traits::PageRenderer;
use crate::infrastructure::metrics::IMAGES_TOTAL;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, instrument};

/// 单张图片的两项检查结果
struct ImageCheck {
    sample: ImageSample,
    report: Option<QualityReport>,
}

/// 页面分析器
///
/// 组合提取、下载、分类与重复检测，产出单个页面的审计结论。
pub struct PageAnalyzer {
    renderer: Arc<dyn PageRenderer>,
    fetcher: ImageFetcher,
    extractor: PageImageExtractor,
    classifier: Arc<ImageClassifier>,
    detector: DuplicateDetector,
    quality_checks: bool,
    fetch_concurrency: usize,
}

impl PageAnalyzer {
    /// 创建新的页面分析器
    ///
    /// # 参数
    ///
    /// * `renderer` - 页面渲染器（通常已包装渲染并发限制）
    /// * `fetcher` - 图片下载器
    /// * `settings` - 图片检查配置
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        fetcher: ImageFetcher,
        settings: &ImageSettings,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            extractor: PageImageExtractor::new(),
            classifier: Arc::new(ImageClassifier::new(settings)),
            detector: DuplicateDetector::new(settings.excluded_domains.clone()),
            quality_checks: settings.quality_checks,
            fetch_concurrency: settings.fetch_concurrency.max(1),
        }
    }

    /// 渲染并分析一个页面
    ///
    /// 渲染失败返回 `PageOutcome::Failed`，不会影响其他页面。
    #[instrument(skip(self, target), fields(url = %target.url))]
    pub async fn audit(&self, target: &PageTarget) -> PageOutcome {
        match self.renderer.render(&target.url).await {
            Ok(html) => PageOutcome::Analyzed(self.analyze(target, &html).await),
            Err(e) => PageOutcome::Failed(PageFailure {
                url: target.url.clone(),
                reason: FailureReason::Render(e),
            }),
        }
    }

    /// 分析已渲染的页面
    ///
    /// 所有图片检查完成后才进行重复检测。
    pub async fn analyze(&self, target: &PageTarget, html: &str) -> PageVerdict {
        let urls = self.extractor.extract(html, &target.domain);
        debug!(count = urls.len(), "Extracted image URLs");

        let check_futures: Vec<_> = urls.iter().map(|url| self.check_image(url)).collect();
        let checks: Vec<ImageCheck> = stream::iter(check_futures)
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut verdict = PageVerdict::empty(target.url.clone());
        let mut samples = Vec::with_capacity(checks.len());

        for check in checks {
            metrics::counter!(IMAGES_TOTAL, "outcome" => check.sample.outcome.as_str())
                .increment(1);
            match check.sample.outcome {
                FetchOutcome::Broken => {
                    verdict.broken_urls.insert(check.sample.url.clone());
                }
                FetchOutcome::Placeholder => {
                    verdict.placeholder_urls.insert(check.sample.url.clone());
                }
                FetchOutcome::Ok => {}
            }
            if let Some(report) = check.report {
                verdict.quality_reports.push(report);
            }
            samples.push(check.sample);
        }

        verdict.duplicate_urls = self.detector.find_duplicates(&samples).all_duplicates();
        verdict
    }

    // Both checks share one download; neither result gates the other.
    async fn check_image(&self, url: &str) -> ImageCheck {
        let placeholder = self.fetcher.is_placeholder(url);
        let excluded = self.classifier.is_excluded(url);
        let needs_report_bytes = self.quality_checks && !excluded;

        let fetched: Option<Result<Arc<Vec<u8>>, FetchError>> =
            if !placeholder || needs_report_bytes {
                Some(self.fetcher.fetch_bytes(url).await.map(Arc::new))
            } else {
                None
            };

        let sample = async {
            if placeholder {
                return ImageSample::placeholder(url);
            }
            match &fetched {
                Some(Ok(bytes)) => self.fetcher.sample_from_bytes(url, bytes.clone()).await,
                _ => ImageSample::broken(url),
            }
        };

        let report = async {
            if !self.quality_checks {
                return None;
            }
            if excluded {
                return Some(QualityReport::excluded(url));
            }
            Some(match &fetched {
                Some(Ok(bytes)) => self.classify_blocking(url, bytes.clone()).await,
                Some(Err(e)) => self.classifier.report_error(url, e),
                None => QualityReport::failed(url, "image was not fetched"),
            })
        };

        let (sample, report) = tokio::join!(sample, report);
        ImageCheck { sample, report }
    }

    async fn classify_blocking(&self, url: &str, bytes: Arc<Vec<u8>>) -> QualityReport {
        let classifier = self.classifier.clone();
        let owned_url = url.to_string();
        tokio::task::spawn_blocking(move || classifier.classify(&owned_url, &bytes))
            .await
            .unwrap_or_else(|e| {
                QualityReport::failed(url, format!("classification task failed: {}", e))
            })
    }
}

#[cfg(test)]
#[path = "page_analyzer_test.rs"]
mod tests;
