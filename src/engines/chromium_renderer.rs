// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RenderSettings;
use crate::engines::traits::{PageRenderer, RenderError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Chromium渲染器
///
/// 基于chromiumoxide，浏览器只启动（或连接）一次，每个页面使用独立的标签页
pub struct ChromiumRenderer {
    settings: RenderSettings,
    browser: OnceCell<Browser>,
}

impl ChromiumRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            browser: OnceCell::new(),
        }
    }

    // Launch or connect lazily so a run that never renders never starts Chrome.
    async fn browser(&self) -> Result<&Browser, RenderError> {
        self.browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = if let Some(url) = &self.settings.remote_debugging_url
                {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url.as_str()).await.map_err(|e| {
                        RenderError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let mut builder = BrowserConfig::builder()
                        .request_timeout(self.settings.navigation_timeout())
                        .args(self.settings.launch_args.iter().map(String::as_str));

                    if let Some(path) = &self.settings.chrome_executable {
                        builder = builder.chrome_executable(path);
                    }

                    let config = builder.build().map_err(RenderError::Browser)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| RenderError::Browser(e.to_string()))?
                };

                // Drive browser events until the connection closes
                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }
}

/// 可关闭的浏览器标签页
#[async_trait]
trait Tab: Send + 'static {
    async fn close_tab(self);
}

#[async_trait]
impl Tab for Page {
    async fn close_tab(self) {
        if let Err(e) = self.close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

/// 标签页守卫
///
/// 渲染被取消（例如页面任务超时）时，在后台关闭标签页，避免共享浏览器中残留页面。
struct TabGuard<T: Tab> {
    tab: Option<T>,
}

impl<T: Tab> TabGuard<T> {
    fn new(tab: T) -> Self {
        Self { tab: Some(tab) }
    }

    async fn close(mut self) {
        if let Some(tab) = self.tab.take() {
            tab.close_tab().await;
        }
    }
}

impl<T: Tab> Drop for TabGuard<T> {
    fn drop(&mut self) {
        if let Some(tab) = self.tab.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(tab.close_tab());
                }
                Err(_) => warn!("No runtime available to close an abandoned page"),
            }
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    /// 渲染页面并返回HTML
    ///
    /// 证书主机名不匹配只记录警告，仍然读取页面内容；其他导航错误直接返回。
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let browser = self.browser().await?;
        let start = Instant::now();
        let timeout = self.settings.navigation_timeout();

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        let guard = TabGuard::new(page.clone());

        let result = tokio::time::timeout(timeout, async {
            if let Err(e) = page.goto(url).await {
                let err = RenderError::from_navigation_message(e.to_string());
                if !err.is_tolerable() {
                    return Err(err);
                }
                warn!(url, "Ignoring TLS hostname mismatch: {}", err);
            }

            page.content()
                .await
                .map_err(|e| RenderError::Browser(e.to_string()))
        })
        .await
        .unwrap_or(Err(RenderError::Timeout(timeout)));

        guard.close().await;

        debug!(
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Render finished"
        );
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
