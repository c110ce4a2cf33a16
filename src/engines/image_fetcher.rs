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
use crate::domain::models::ImageSample;
use crate::utils::errors::DecodeError;
use crate::utils::url_utils;
use image::imageops::FilterType;
use image::RgbImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 图片下载错误
#[derive(Error, Debug)]
pub enum FetchError {
    /// 非2xx响应
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    /// 超时
    #[error("Request timed out: {url}")]
    Timeout { url: String },
    /// 网络错误
    #[error("Request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// 图片下载器
///
/// 基于reqwest，所有请求共用一个带固定超时的客户端
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    settings: ImageSettings,
}

impl ImageFetcher {
    /// 创建新的图片下载器
    pub fn new(settings: ImageSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.fetch_timeout())
            .build()?;

        Ok(Self { client, settings })
    }

    /// URL是否命中占位图关键字
    pub fn is_placeholder(&self, url: &str) -> bool {
        url_utils::contains_any_ignore_case(url, &self.settings.placeholder_keywords)
    }

    /// 下载图片原始字节
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<u8>)` - 响应体
    /// * `Err(FetchError)` - 非2xx状态、网络错误或超时
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        Ok(bytes.to_vec())
    }

    /// 下载并标准化图片
    ///
    /// 占位图直接返回 `Placeholder`，不发起请求；下载或解码失败返回 `Broken`。
    pub async fn fetch_decoded_bitmap(&self, url: &str) -> ImageSample {
        if self.is_placeholder(url) {
            return ImageSample::placeholder(url);
        }

        let fetched = self.fetch_bytes(url).await;
        self.sample_from_fetch(url, fetched).await
    }

    /// 由一次下载结果构建样本
    pub async fn sample_from_fetch(
        &self,
        url: &str,
        fetched: Result<Vec<u8>, FetchError>,
    ) -> ImageSample {
        match fetched {
            Ok(bytes) => self.sample_from_bytes(url, Arc::new(bytes)).await,
            Err(e) => {
                debug!(url, "Image fetch failed: {}", e);
                ImageSample::broken(url)
            }
        }
    }

    /// 在阻塞线程池中解码，页面分析时与质量检查共享同一份字节
    pub async fn sample_from_bytes(&self, url: &str, bytes: Arc<Vec<u8>>) -> ImageSample {
        let canvas = self.settings.canvas_size;
        let decoded =
            tokio::task::spawn_blocking(move || Self::decode_bitmap(&bytes, canvas)).await;

        match decoded {
            Ok(Ok(bitmap)) => ImageSample::ok(url, bitmap),
            Ok(Err(e)) => {
                debug!(url, "Image decode failed: {}", e);
                ImageSample::broken(url)
            }
            Err(e) => {
                debug!(url, "Image decode task failed: {}", e);
                ImageSample::broken(url)
            }
        }
    }

    /// 解码图片并缩放到 `canvas × canvas` 的RGB位图
    pub fn decode_bitmap(bytes: &[u8], canvas: u32) -> Result<RgbImage, DecodeError> {
        let image = image::load_from_memory(bytes)?;
        Ok(image
            .resize_exact(canvas, canvas, FilterType::Lanczos3)
            .to_rgb8())
    }
}
