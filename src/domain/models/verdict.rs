// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::quality::QualityReport;
use crate::engines::traits::RenderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// 单个页面的审计结论
///
/// 由页面分析器构建，加入结果集合后不再修改。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageVerdict {
    /// 页面URL
    pub url: String,
    /// 无法下载或解码的图片
    pub broken_urls: BTreeSet<String>,
    /// 命中占位图关键字的图片
    pub placeholder_urls: BTreeSet<String>,
    /// 与页面中更早出现的图片完全相同的图片
    pub duplicate_urls: BTreeSet<String>,
    /// 按提取顺序排列的质量报告
    pub quality_reports: Vec<QualityReport>,
}

impl PageVerdict {
    /// 空结论，用于渲染失败的页面
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 是否存在任意一类问题
    pub fn has_issues(&self) -> bool {
        !self.broken_urls.is_empty()
            || !self.placeholder_urls.is_empty()
            || !self.duplicate_urls.is_empty()
            || self.quality_reports.iter().any(QualityReport::is_defect)
    }

    /// 转换为投递格式，空分类使用 `none_sentinel`
    pub fn to_record(&self, none_sentinel: &str) -> PageRecord {
        PageRecord {
            url: self.url.clone(),
            broken: join_or_sentinel(&self.broken_urls, none_sentinel),
            placeholder: join_or_sentinel(&self.placeholder_urls, none_sentinel),
            duplicate: join_or_sentinel(&self.duplicate_urls, none_sentinel),
            blur_details: self.quality_reports.clone(),
        }
    }
}

fn join_or_sentinel(urls: &BTreeSet<String>, none_sentinel: &str) -> String {
    if urls.is_empty() {
        none_sentinel.to_string()
    } else {
        urls.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// 结果投递记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub broken: String,
    pub placeholder: String,
    pub duplicate: String,
    pub blur_details: Vec<QualityReport>,
}

/// 页面失败原因
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// 页面渲染失败
    Render(RenderError),
    /// 超过单页面任务时限
    Timeout(Duration),
    /// 任务异常退出
    Aborted(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Render(e) => write!(f, "render failed: {}", e),
            FailureReason::Timeout(d) => write!(f, "timed out after {:?}", d),
            FailureReason::Aborted(msg) => write!(f, "task aborted: {}", msg),
        }
    }
}

/// 页面失败
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub url: String,
    pub reason: FailureReason,
}

/// 页面分析的结果
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Analyzed(PageVerdict),
    Failed(PageFailure),
}

impl PageOutcome {
    pub fn url(&self) -> &str {
        match self {
            PageOutcome::Analyzed(v) => &v.url,
            PageOutcome::Failed(f) => &f.url,
        }
    }

    /// 失败的页面得到空结论
    pub fn into_verdict(self) -> PageVerdict {
        match self {
            PageOutcome::Analyzed(verdict) => verdict,
            PageOutcome::Failed(failure) => PageVerdict::empty(failure.url),
        }
    }
}
