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

use crate::utils::errors::AuditError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 应用程序配置设置
///
/// 所有字段都有默认值，配置文件和环境变量只需覆盖需要修改的项
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URL提供方配置
    pub provider: ProviderSettings,
    /// 结果投递配置
    pub sink: SinkSettings,
    /// 批处理与并发配置
    pub crawl: CrawlSettings,
    /// 浏览器渲染配置
    pub render: RenderSettings,
    /// 图片检查配置
    pub image: ImageSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// URL提供方配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// 返回 `{"urls": [...]}` 的端点
    pub url: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
        }
    }
}

/// 结果投递配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    /// Webhook端点
    pub url: Option<String>,
    /// 写入本地文件而不是Webhook
    pub output_path: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 分类为空时使用的占位文本
    pub none_sentinel: String,
    /// 设置后结果包装为 `{"type": ..., "data": [...]}`
    pub envelope_type: Option<String>,
    /// 是否投递没有问题的页面
    pub report_clean_pages: bool,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            url: None,
            output_path: None,
            timeout_secs: 30,
            none_sentinel: "Geen".to_string(),
            envelope_type: None,
            report_clean_pages: true,
        }
    }
}

/// 批处理与并发配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// 同时进行的页面渲染上限（全局）
    pub concurrency_limit: usize,
    /// 每批页面数
    pub batch_size: usize,
    /// 单个页面任务超时时间（秒）
    pub task_timeout_secs: u64,
    /// 页面失败是否以warn级别记录
    pub log_page_failures: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            batch_size: 10,
            task_timeout_secs: 120,
            log_page_failures: true,
        }
    }
}

impl CrawlSettings {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

/// 浏览器渲染配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// 页面导航超时时间（秒）
    pub navigation_timeout_secs: u64,
    /// 远程Chrome调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// Chrome可执行文件路径
    pub chrome_executable: Option<String>,
    /// 浏览器启动参数
    pub launch_args: Vec<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 60,
            remote_debugging_url: None,
            chrome_executable: None,
            launch_args: vec![
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

impl RenderSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

/// 图片检查配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// 图片下载超时时间（秒）
    pub fetch_timeout_secs: u64,
    /// 单个页面内同时下载的图片数
    pub fetch_concurrency: usize,
    /// 重复检测使用的画布边长
    pub canvas_size: u32,
    /// 拉普拉斯方差低于该值视为模糊
    pub blur_threshold: f64,
    /// 最小宽度
    pub min_width: u32,
    /// 最小高度
    pub min_height: u32,
    /// URL中出现即视为占位图的关键字
    pub placeholder_keywords: Vec<String>,
    /// 不参与质量检查和重复检测的域名
    pub excluded_domains: Vec<String>,
    /// 是否执行模糊/尺寸检查
    pub quality_checks: bool,
    /// 下载图片使用的User-Agent
    pub user_agent: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            fetch_concurrency: 16,
            canvas_size: 256,
            blur_threshold: 100.0,
            min_width: 1200,
            min_height: 1200,
            placeholder_keywords: vec![
                "placeholder".to_string(),
                "small_image".to_string(),
                "default_image".to_string(),
                "no_image".to_string(),
            ],
            excluded_domains: vec!["storage.googleapis.com".to_string()],
            quality_checks: true,
            user_agent: "Mozilla/5.0 (compatible; imgaudit/0.1)".to_string(),
        }
    }
}

impl ImageSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 日志配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub format: LogFormat,
}

/// 指标配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Prometheus监听地址，例如 `0.0.0.0:9000`；为空时不启动
    pub listen_addr: Option<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载 `config/default`、`config/{APP_ENVIRONMENT}` 和 `IMGAUDIT__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// 额外加载指定的配置文件，其优先级高于默认文件、低于环境变量
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    fn load(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("IMGAUDIT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("image.placeholder_keywords")
                .with_list_parse_key("image.excluded_domains")
                .with_list_parse_key("render.launch_args")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// 校验配置的取值范围
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.crawl.concurrency_limit == 0 {
            return Err(AuditError::InvalidSettings(
                "crawl.concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.crawl.batch_size == 0 {
            return Err(AuditError::InvalidSettings(
                "crawl.batch_size must be at least 1".to_string(),
            ));
        }
        if self.crawl.task_timeout_secs == 0 || self.image.fetch_timeout_secs == 0 {
            return Err(AuditError::InvalidSettings(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.image.canvas_size == 0 || self.image.fetch_concurrency == 0 {
            return Err(AuditError::InvalidSettings(
                "image.canvas_size and image.fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
