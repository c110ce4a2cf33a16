// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 审计运行错误类型
///
/// 只有这些错误会终止整个运行；单个页面或图片的失败在局部恢复。
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("URL提供方未返回任何页面")]
    NoTargets,

    #[error("URL提供方错误: {0}")]
    Provider(String),

    #[error("结果投递失败: {0}")]
    Delivery(String),

    #[error("无效配置: {0}")]
    InvalidSettings(String),
}

/// 图片解码错误
#[derive(Error, Debug)]
#[error("无法识别的图片格式: {0}")]
pub struct DecodeError(#[from] pub image::ImageError);
