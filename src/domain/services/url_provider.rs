// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::AuditError;
use async_trait::async_trait;

/// URL提供方特质
///
/// 每次运行调用一次，返回待审计的页面地址
#[async_trait]
pub trait UrlProvider: Send + Sync {
    /// 获取页面URL列表
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 页面地址，可能为空
    /// * `Err(AuditError::Provider)` - 提供方不可用或响应无法解析
    async fn fetch_urls(&self) -> Result<Vec<String>, AuditError>;
}
