// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ImageSettings;
use crate::domain::models::{QualityReport, ResolutionCheck, Sharpness};
use crate::utils::errors::DecodeError;
use crate::utils::url_utils;
use image::{GrayImage, Luma, RgbImage};
use std::fmt::Display;

/// 图片质量分类器
///
/// 用拉普拉斯方差衡量清晰度，并检查最小分辨率。
#[derive(Debug, Clone)]
pub struct ImageClassifier {
    blur_threshold: f64,
    min_width: u32,
    min_height: u32,
    excluded_domains: Vec<String>,
}

impl ImageClassifier {
    pub fn new(settings: &ImageSettings) -> Self {
        Self {
            blur_threshold: settings.blur_threshold,
            min_width: settings.min_width,
            min_height: settings.min_height,
            excluded_domains: settings.excluded_domains.clone(),
        }
    }

    /// URL是否属于排除名单（有意压缩或缩小的图片，例如支付方或对象存储）
    pub fn is_excluded(&self, url: &str) -> bool {
        url_utils::contains_any_ignore_case(url, &self.excluded_domains)
    }

    /// 对一张图片分类
    ///
    /// 排除名单中的地址直接返回 `excluded`；解码失败返回只带错误信息的报告。
    /// 相同输入总是得到相同结果。
    pub fn classify(&self, url: &str, bytes: &[u8]) -> QualityReport {
        if self.is_excluded(url) {
            return QualityReport::excluded(url);
        }

        match Self::decode(bytes) {
            Ok(rgb) => self.measure(url, &rgb),
            Err(e) => self.report_error(url, &e),
        }
    }

    /// 下载或解码失败时的报告
    pub fn report_error(&self, url: &str, error: &dyn Display) -> QualityReport {
        QualityReport::failed(url, error.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
        Ok(image::load_from_memory(bytes)?.to_rgb8())
    }

    fn measure(&self, url: &str, rgb: &RgbImage) -> QualityReport {
        let (width, height) = rgb.dimensions();
        let blur_score = laplacian_variance(&grayscale(rgb));

        let sharpness = if blur_score < self.blur_threshold {
            Sharpness::Blurry
        } else {
            Sharpness::Sharp
        };
        let resolution_check = if width < self.min_width || height < self.min_height {
            ResolutionCheck::TooSmall
        } else {
            ResolutionCheck::Ok
        };

        QualityReport {
            url: url.to_string(),
            width: Some(width),
            height: Some(height),
            blur_score: Some((blur_score * 100.0).round() / 100.0),
            sharpness: Some(sharpness),
            resolution_check: Some(resolution_check),
            excluded: false,
            error: None,
        }
    }
}

/// 按ITU-R BT.601权重转换为8位灰度
pub fn grayscale(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// 3×3拉普拉斯算子（`[0,1,0; 1,-4,1; 0,1,0]`）响应的总体方差
///
/// 边界按reflect-101处理，所有像素都参与统计。整数累加，结果与计算顺序无关。
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let (w, h) = (width as i64, height as i64);
    let at = |x: i64, y: i64| -> i64 {
        gray.get_pixel(reflect_101(x, w) as u32, reflect_101(y, h) as u32).0[0] as i64
    };

    let mut sum: i128 = 0;
    let mut sum_sq: i128 = 0;
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4 * at(x, y);
            sum += response as i128;
            sum_sq += (response * response) as i128;
        }
    }

    let n = (w * h) as i128;
    (n * sum_sq - sum * sum) as f64 / (n * n) as f64
}

fn reflect_101(i: i64, len: i64) -> i64 {
    if len == 1 {
        0
    } else if i < 0 {
        -i
    } else if i >= len {
        2 * len - 2 - i
    } else {
        i
    }
}
