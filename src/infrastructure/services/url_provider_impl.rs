// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ProviderSettings;
use crate::domain::services::url_provider::UrlProvider;
use crate::utils::errors::AuditError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// 提供方响应体，缺少 `urls` 字段或为 `null` 时视为空列表
#[derive(Debug, Default, Deserialize)]
struct UrlListResponse {
    #[serde(default)]
    urls: Option<Vec<String>>,
}

/// 基于HTTP GET的URL提供方
pub struct HttpUrlProvider {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 提供方端点
    endpoint: String,
}

impl HttpUrlProvider {
    /// 创建新的HTTP提供方
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// 由配置创建，未配置端点时返回 `None`
    pub fn from_settings(settings: &ProviderSettings) -> Option<Self> {
        settings
            .url
            .as_ref()
            .map(|url| Self::new(url.clone(), Duration::from_secs(settings.timeout_secs)))
    }
}

#[async_trait]
impl UrlProvider for HttpUrlProvider {
    async fn fetch_urls(&self) -> Result<Vec<String>, AuditError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| {
                AuditError::Provider(format!("request to {} failed: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Provider(format!(
                "{} responded with status {}: {}",
                self.endpoint, status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuditError::Provider(format!("failed to read response body: {}", e)))?;
        debug!(endpoint = %self.endpoint, "Provider response: {}", body);

        let parsed: UrlListResponse = serde_json::from_str(&body)
            .map_err(|e| AuditError::Provider(format!("invalid provider response: {}", e)))?;
        Ok(parsed.urls.unwrap_or_default())
    }
}

/// 固定列表的URL提供方，来源于命令行参数或文本文件
#[derive(Debug, Clone, Default)]
pub struct StaticUrlProvider {
    urls: Vec<String>,
}

impl StaticUrlProvider {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    /// 从每行一个URL的文件读取，跳过空行与 `#` 开头的注释行
    pub fn from_file(path: &Path) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Provider(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::new(parse_url_lines(&content)))
    }

    /// 追加URL
    pub fn extend(&mut self, urls: impl IntoIterator<Item = String>) {
        self.urls.extend(urls);
    }
}

fn parse_url_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl UrlProvider for StaticUrlProvider {
    async fn fetch_urls(&self) -> Result<Vec<String>, AuditError> {
        Ok(self.urls.clone())
    }
}
