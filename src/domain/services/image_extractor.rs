// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ImageRef;
use crate::utils::url_utils;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector is valid"));

/// 页面图片提取器
///
/// 从渲染后的HTML中收集 `<img src>`，过滤SVG与第三方CDN资源并转换为绝对地址。
/// 保留源页面中的顺序和重复出现。
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImageExtractor;

impl PageImageExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取绝对图片地址
    pub fn extract(&self, html: &str, domain: &str) -> Vec<String> {
        self.extract_refs(html, domain)
            .into_iter()
            .map(|r| r.absolute_url)
            .collect()
    }

    /// 提取图片引用（原始值与绝对地址）
    pub fn extract_refs(&self, html: &str, domain: &str) -> Vec<ImageRef> {
        let document = Html::parse_document(html);

        document
            .select(&IMG_SELECTOR)
            .filter_map(|element| element.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .filter(|src| Self::is_candidate(src, domain))
            .map(|src| ImageRef {
                raw_url: src.to_string(),
                absolute_url: url_utils::absolutize(domain, src),
            })
            .collect()
    }

    /// 过滤规则：
    /// - 含 `.svg` 的地址（不区分大小写）
    /// - 含 `cdn` 但不含页面域名的地址（第三方CDN；站点自己的CDN子域保留）
    fn is_candidate(src: &str, domain: &str) -> bool {
        if src.to_lowercase().contains(".svg") {
            return false;
        }
        !(src.contains("cdn") && !src.contains(domain))
    }
}
