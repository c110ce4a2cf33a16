// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 待审计页面
///
/// `domain` 取自URL的authority部分，用于解析页面中的相对图片地址。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTarget {
    /// 页面URL
    pub url: String,
    /// 页面域名
    pub domain: String,
}

impl PageTarget {
    /// 从绝对URL构建页面目标，没有主机名的URL返回 `None`
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        let domain = url_utils::page_domain(url)?;
        Some(Self {
            url: url.to_string(),
            domain,
        })
    }
}

/// 页面中的一个图片引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// `src` 属性中的原始值
    pub raw_url: String,
    /// 绝对地址
    pub absolute_url: String,
}

/// 图片下载结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    Ok,
    Broken,
    Placeholder,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Broken => "broken",
            FetchOutcome::Placeholder => "placeholder",
        }
    }
}

/// 单张图片的标准化样本
///
/// 只有 `Ok` 的样本带有位图（固定画布尺寸的RGB图像）。只在一次页面分析内存活。
#[derive(Debug, Clone)]
pub struct ImageSample {
    pub url: String,
    pub bitmap: Option<RgbImage>,
    pub outcome: FetchOutcome,
}

impl ImageSample {
    pub fn ok(url: impl Into<String>, bitmap: RgbImage) -> Self {
        Self {
            url: url.into(),
            bitmap: Some(bitmap),
            outcome: FetchOutcome::Ok,
        }
    }

    pub fn broken(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bitmap: None,
            outcome: FetchOutcome::Broken,
        }
    }

    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bitmap: None,
            outcome: FetchOutcome::Placeholder,
        }
    }
}
