// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{CrawlSettings, SinkSettings};
use crate::domain::models::{FailureReason, PageFailure, PageOutcome, PageTarget, PageVerdict};
use crate::domain::services::page_analyzer::PageAnalyzer;
use crate::domain::services::result_sink::ResultSink;
use crate::domain::services::url_provider::UrlProvider;
use crate::infrastructure::metrics::{PAGES_TOTAL, PAGE_TIMEOUTS_TOTAL};
use crate::utils::errors::AuditError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 运行状态
///
/// `Idle → FetchingUrls → Running → Aggregating → Done`，致命错误时进入 `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    FetchingUrls,
    /// 正在处理第 `batch` 批（从1开始），共 `total` 批
    Running { batch: usize, total: usize },
    Aggregating,
    Done,
    Failed,
}

/// 单个批次的执行情况
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// 批次序号，从0开始
    pub index: usize,
    pub size: usize,
    pub analyzed: usize,
    pub failed: usize,
    /// 超时被丢弃的页面
    pub timed_out: Vec<String>,
}

/// 一次运行的汇总
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub batches: Vec<BatchReport>,
    /// 按批次与页面顺序排列的结论，不含超时页面
    pub verdicts: Vec<PageVerdict>,
    /// 实际投递的记录数
    pub delivered: usize,
}

/// 审计编排器
///
/// 获取URL列表，分批并发审计页面，最后把结论一次性交给结果投递。
/// 批次之间顺序执行；批内任务并发，渲染并发由渲染器上的限流器控制。
pub struct CrawlOrchestrator {
    provider: Arc<dyn UrlProvider>,
    sink: Arc<dyn ResultSink>,
    analyzer: Arc<PageAnalyzer>,
    crawl: CrawlSettings,
    sink_settings: SinkSettings,
    state: RwLock<RunState>,
}

impl CrawlOrchestrator {
    pub fn new(
        provider: Arc<dyn UrlProvider>,
        sink: Arc<dyn ResultSink>,
        analyzer: Arc<PageAnalyzer>,
        crawl: CrawlSettings,
        sink_settings: SinkSettings,
    ) -> Self {
        Self {
            provider,
            sink,
            analyzer,
            crawl,
            sink_settings,
            state: RwLock::new(RunState::Idle),
        }
    }

    /// 当前运行状态
    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    fn set_state(&self, state: RunState) {
        *self.state.write() = state;
    }

    /// 执行一次完整的审计运行
    ///
    /// # 返回值
    ///
    /// * `Ok(RunSummary)` - 运行完成，单个页面的问题或失败不影响结果
    /// * `Err(AuditError)` - 提供方失败、没有目标页面或投递失败
    pub async fn run(&self) -> Result<RunSummary, AuditError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("audit_run", %run_id);

        let result = self.execute(run_id, started_at).instrument(span).await;
        match &result {
            Ok(_) => self.set_state(RunState::Done),
            Err(e) => {
                error!(%run_id, "Audit run failed: {}", e);
                self.set_state(RunState::Failed);
            }
        }
        result
    }

    async fn execute(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<RunSummary, AuditError> {
        self.set_state(RunState::FetchingUrls);
        let urls = self.provider.fetch_urls().await?;
        info!(count = urls.len(), "Fetched page URLs");

        let targets = Self::prepare_targets(urls);
        if targets.is_empty() {
            return Err(AuditError::NoTargets);
        }

        let batch_size = self.crawl.batch_size.max(1);
        let total = targets.len().div_ceil(batch_size);
        let mut batches = Vec::with_capacity(total);
        let mut verdicts = Vec::with_capacity(targets.len());

        for (index, chunk) in targets.chunks(batch_size).enumerate() {
            self.set_state(RunState::Running {
                batch: index + 1,
                total,
            });
            info!(batch = index + 1, total, size = chunk.len(), "Starting batch");

            let (report, batch_verdicts) = self.run_batch(index, chunk).await;
            info!(
                batch = index + 1,
                analyzed = report.analyzed,
                failed = report.failed,
                timed_out = report.timed_out.len(),
                "Batch finished"
            );
            batches.push(report);
            verdicts.extend(batch_verdicts);
        }

        self.set_state(RunState::Aggregating);
        let delivered = self.deliver(&verdicts).await?;

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            batches,
            verdicts,
            delivered,
        })
    }

    /// 解析并去重目标页面，保留首次出现的顺序
    fn prepare_targets(urls: Vec<String>) -> Vec<PageTarget> {
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(urls.len());

        for url in urls {
            match PageTarget::from_url(&url) {
                Some(target) => {
                    if seen.insert(target.url.clone()) {
                        targets.push(target);
                    } else {
                        debug!(url = %target.url, "Skipping duplicate page URL");
                    }
                }
                None => warn!(url = %url, "Skipping invalid page URL"),
            }
        }
        targets
    }

    async fn run_batch(
        &self,
        index: usize,
        chunk: &[PageTarget],
    ) -> (BatchReport, Vec<PageVerdict>) {
        let timeout = self.crawl.task_timeout();

        let handles: Vec<_> = chunk
            .iter()
            .cloned()
            .map(|target| {
                let analyzer = self.analyzer.clone();
                tokio::spawn(
                    async move { tokio::time::timeout(timeout, analyzer.audit(&target)).await }
                        .in_current_span(),
                )
            })
            .collect();

        let mut report = BatchReport {
            index,
            size: chunk.len(),
            ..Default::default()
        };
        let mut verdicts = Vec::with_capacity(chunk.len());

        for (target, joined) in chunk.iter().zip(join_all(handles).await) {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_elapsed)) => {
                    metrics::counter!(PAGE_TIMEOUTS_TOTAL).increment(1);
                    metrics::counter!(PAGES_TOTAL, "outcome" => "timeout").increment(1);
                    self.log_failure(&PageFailure {
                        url: target.url.clone(),
                        reason: FailureReason::Timeout(timeout),
                    });
                    report.timed_out.push(target.url.clone());
                    continue;
                }
                Err(join_error) => PageOutcome::Failed(PageFailure {
                    url: target.url.clone(),
                    reason: FailureReason::Aborted(join_error.to_string()),
                }),
            };

            match &outcome {
                PageOutcome::Analyzed(verdict) => {
                    report.analyzed += 1;
                    if verdict.has_issues() {
                        metrics::counter!(PAGES_TOTAL, "outcome" => "issues").increment(1);
                        info!(
                            url = %verdict.url,
                            broken = verdict.broken_urls.len(),
                            placeholder = verdict.placeholder_urls.len(),
                            duplicate = verdict.duplicate_urls.len(),
                            "Issues found on page"
                        );
                    } else {
                        metrics::counter!(PAGES_TOTAL, "outcome" => "clean").increment(1);
                        info!(url = %verdict.url, "Page is clean");
                    }
                }
                PageOutcome::Failed(failure) => {
                    report.failed += 1;
                    metrics::counter!(PAGES_TOTAL, "outcome" => "failed").increment(1);
                    self.log_failure(failure);
                }
            }
            verdicts.push(outcome.into_verdict());
        }

        (report, verdicts)
    }

    fn log_failure(&self, failure: &PageFailure) {
        if self.crawl.log_page_failures {
            warn!(url = %failure.url, "Page audit failed: {}", failure.reason);
        } else {
            debug!(url = %failure.url, "Page audit failed: {}", failure.reason);
        }
    }

    /// 汇总并投递，返回投递的记录数；没有可投递的记录时不调用投递方
    async fn deliver(&self, verdicts: &[PageVerdict]) -> Result<usize, AuditError> {
        let records: Vec<_> = verdicts
            .iter()
            .filter(|v| self.sink_settings.report_clean_pages || v.has_issues())
            .map(|v| v.to_record(&self.sink_settings.none_sentinel))
            .collect();

        if records.is_empty() {
            info!("No records to deliver");
            return Ok(0);
        }

        let destination = self.sink.destination();
        info!(records = records.len(), %destination, "Delivering results");
        self.sink.deliver(&records).await?;
        Ok(records.len())
    }
}
