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

use crate::engines::traits::{PageRenderer, RenderError};
use crate::infrastructure::metrics::RENDERS_IN_FLIGHT;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 渲染并发限制器
///
/// 整个运行共享一个信号量，限制同时打开的浏览器页面数。
#[derive(Clone, Debug)]
pub struct RenderLimiter {
    /// 共享信号量
    semaphore: Arc<Semaphore>,
    /// 许可总数
    permits: usize,
}

impl RenderLimiter {
    /// 创建一个新的RenderLimiter实例
    ///
    /// # 参数
    ///
    /// * `permits` - 同时渲染的页面上限
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
        }
    }

    /// 获取一个渲染许可，许可被释放前占用一个渲染名额
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, RenderError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RenderError::Browser(format!("render limiter closed: {}", e)))
    }

    /// 许可总数
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// 当前正在使用的许可数
    pub fn in_flight(&self) -> usize {
        self.permits - self.semaphore.available_permits()
    }
}

// Decrements on drop so a render cancelled by the page timeout is still counted out.
struct InFlightGauge(metrics::Gauge);

impl InFlightGauge {
    fn enter() -> Self {
        let gauge = metrics::gauge!(RENDERS_IN_FLIGHT);
        gauge.increment(1.0);
        Self(gauge)
    }
}

impl Drop for InFlightGauge {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}

/// 带并发限制的渲染器
///
/// 只在渲染调用期间持有许可，页面分析的其余部分不受限制
pub struct LimitedRenderer {
    inner: Arc<dyn PageRenderer>,
    limiter: RenderLimiter,
}

impl LimitedRenderer {
    pub fn new(inner: Arc<dyn PageRenderer>, limiter: RenderLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn limiter(&self) -> &RenderLimiter {
        &self.limiter
    }
}

#[async_trait]
impl PageRenderer for LimitedRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let _permit = self.limiter.acquire().await?;
        let _gauge = InFlightGauge::enter();
        self.inner.render(url).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
