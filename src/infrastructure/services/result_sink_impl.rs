// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SinkSettings;
use crate::domain::models::PageRecord;
use crate::domain::services::result_sink::ResultSink;
use crate::utils::errors::AuditError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 构建投递负载：裸数组，或 `{"type", "data"}` 包装
fn build_payload(records: &[PageRecord], envelope_type: Option<&str>) -> Result<Value, AuditError> {
    let data = serde_json::to_value(records)
        .map_err(|e| AuditError::Delivery(format!("failed to serialize records: {}", e)))?;
    Ok(match envelope_type {
        Some(kind) => json!({ "type": kind, "data": data }),
        None => data,
    })
}

/// Webhook结果投递
pub struct WebhookResultSink {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 投递端点
    endpoint: String,
    /// 可选的包装类型
    envelope_type: Option<String>,
}

impl WebhookResultSink {
    /// 创建新的Webhook投递
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        envelope_type: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into(),
            envelope_type,
        }
    }

    /// 由配置创建，未配置端点时返回 `None`
    pub fn from_settings(settings: &SinkSettings) -> Option<Self> {
        settings.url.as_ref().map(|url| {
            Self::new(
                url.clone(),
                Duration::from_secs(settings.timeout_secs),
                settings.envelope_type.clone(),
            )
        })
    }
}

#[async_trait]
impl ResultSink for WebhookResultSink {
    async fn deliver(&self, records: &[PageRecord]) -> Result<(), AuditError> {
        let payload = build_payload(records, self.envelope_type.as_deref())?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AuditError::Delivery(format!("request to {} failed: {}", self.endpoint, e))
            })?;

        if response.status().is_success() {
            info!(endpoint = %self.endpoint, records = records.len(), "Results delivered");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuditError::Delivery(format!(
                "Webhook delivery failed with status {}: {}",
                status, body
            )))
        }
    }

    fn destination(&self) -> String {
        self.endpoint.clone()
    }
}

/// 写入本地JSON文件的结果投递
#[derive(Debug, Clone)]
pub struct FileResultSink {
    path: PathBuf,
    envelope_type: Option<String>,
}

impl FileResultSink {
    pub fn new(path: impl Into<PathBuf>, envelope_type: Option<String>) -> Self {
        Self {
            path: path.into(),
            envelope_type,
        }
    }
}

#[async_trait]
impl ResultSink for FileResultSink {
    async fn deliver(&self, records: &[PageRecord]) -> Result<(), AuditError> {
        let payload = build_payload(records, self.envelope_type.as_deref())?;
        let bytes = serde_json::to_vec_pretty(&payload)
            .map_err(|e| AuditError::Delivery(format!("failed to serialize records: {}", e)))?;

        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            AuditError::Delivery(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        info!(path = %self.path.display(), records = records.len(), "Results written");
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}
