// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了审计流程的核心数据结构，包括：
/// - 页面（page）：待审计页面、图片引用和标准化后的图片样本
/// - 质量（quality）：单张图片的清晰度与分辨率报告
/// - 结论（verdict）：单个页面的审计结论、失败原因与投递记录
pub mod page;
pub mod quality;
pub mod verdict;

pub use page::{FetchOutcome, ImageRef, ImageSample, PageTarget};
pub use quality::{QualityReport, ResolutionCheck, Sharpness};
pub use verdict::{FailureReason, PageFailure, PageOutcome, PageRecord, PageVerdict};
