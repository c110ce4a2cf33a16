// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 清晰度分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sharpness {
    Sharp,
    Blurry,
}

/// 分辨率检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionCheck {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Too Small")]
    TooSmall,
}

/// 单张图片的质量报告
///
/// 三种形态：
/// - 完整指标（宽、高、模糊分数及分类）
/// - `excluded = true`，不计算指标
/// - 只有 `error`，下载或解码失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "image_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<Sharpness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_check: Option<ResolutionCheck>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QualityReport {
    pub fn excluded(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            blur_score: None,
            sharpness: None,
            resolution_check: None,
            excluded: true,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            blur_score: None,
            sharpness: None,
            resolution_check: None,
            excluded: false,
            error: Some(error.into()),
        }
    }

    pub fn is_blurry(&self) -> bool {
        !self.excluded && self.sharpness == Some(Sharpness::Blurry)
    }

    pub fn is_too_small(&self) -> bool {
        !self.excluded && self.resolution_check == Some(ResolutionCheck::TooSmall)
    }

    /// 错误报告既不算模糊也不算尺寸过小
    pub fn is_defect(&self) -> bool {
        self.is_blurry() || self.is_too_small()
    }
}
