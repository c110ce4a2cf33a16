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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 渲染错误类型
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// 证书主机名不匹配，可容忍
    #[error("TLS hostname mismatch: {0}")]
    TlsHostnameMismatch(String),
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 浏览器启动或通信失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 导航超时
    #[error("Navigation timed out after {0:?}")]
    Timeout(Duration),
}

const HOSTNAME_MISMATCH_MARKERS: [&str; 3] = [
    "ERR_CERT_COMMON_NAME_INVALID",
    "hostname mismatch",
    "Hostname mismatch",
];

impl RenderError {
    /// 根据浏览器返回的导航错误文本归类
    pub fn from_navigation_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if HOSTNAME_MISMATCH_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            RenderError::TlsHostnameMismatch(message)
        } else {
            RenderError::Navigation(message)
        }
    }

    /// 判断错误是否可容忍（记录日志后继续读取页面内容）
    pub fn is_tolerable(&self) -> bool {
        matches!(self, RenderError::TlsHostnameMismatch(_))
    }
}

/// 页面渲染器特质
///
/// 返回DOMContentLoaded之后的完整HTML
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// 渲染页面
    async fn render(&self, url: &str) -> Result<String, RenderError>;

    /// 渲染器名称
    fn name(&self) -> &'static str;
}
