// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::PageRecord;
use crate::utils::errors::AuditError;
use async_trait::async_trait;

/// 结果投递特质
///
/// 每次运行最多调用一次，失败不重试
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// 投递全部页面记录
    ///
    /// # 参数
    ///
    /// * `records` - 按批次与页面顺序排列的记录
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 投递成功
    /// * `Err(AuditError::Delivery)` - 投递失败
    async fn deliver(&self, records: &[PageRecord]) -> Result<(), AuditError>;

    /// 投递目标的描述，用于日志
    fn destination(&self) -> String;
}
