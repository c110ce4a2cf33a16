// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 图片提取（image_extractor）：从渲染后的HTML中取出候选图片地址
/// - 质量分类（image_classifier）：拉普拉斯方差清晰度与最小分辨率检查
/// - 重复检测（duplicate_detector）：标准化位图的精确比较
/// - 页面分析（page_analyzer）：组合以上服务得到单个页面的结论
/// - URL提供方（url_provider）与结果投递（result_sink）：外部接口的抽象
pub mod duplicate_detector;
pub mod image_classifier;
pub mod image_extractor;
pub mod page_analyzer;
pub mod result_sink;
pub mod url_provider;
