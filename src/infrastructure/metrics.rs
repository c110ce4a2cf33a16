// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 正在渲染的页面数
pub const RENDERS_IN_FLIGHT: &str = "imgaudit_renders_in_flight";
/// 按结果统计的页面数（`outcome` = clean / issues / failed / timeout）
pub const PAGES_TOTAL: &str = "imgaudit_pages_total";
/// 按结果统计的图片数（`outcome` = ok / broken / placeholder）
pub const IMAGES_TOTAL: &str = "imgaudit_images_total";
/// 超时页面数
pub const PAGE_TIMEOUTS_TOTAL: &str = "imgaudit_page_timeouts_total";

/// 初始化指标系统
///
/// 未配置 `listen_addr` 时不安装导出器，`metrics` 宏在没有记录器时为空操作。
/// 地址无效或端口被占用只记录警告，不影响审计运行。
pub fn init_metrics(settings: &MetricsSettings) {
    let Some(raw_addr) = settings.listen_addr.as_deref() else {
        return;
    };

    let addr: SocketAddr = match raw_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics listen address {}: {}", raw_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_gauge!(RENDERS_IN_FLIGHT, "Number of page renders currently holding a permit");
    describe_counter!(PAGES_TOTAL, "Total number of audited pages by outcome");
    describe_counter!(IMAGES_TOTAL, "Total number of checked images by outcome");
    describe_counter!(PAGE_TIMEOUTS_TOTAL, "Total number of pages dropped by the task timeout");

    info!("Metrics exporter listening on {}", addr);
}
