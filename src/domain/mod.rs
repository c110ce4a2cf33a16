// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：页面、图片样本、质量报告与页面结论
/// - 服务（services）：提取、分类、重复检测、页面分析以及外部接口特质
///
/// 领域层不依赖具体的浏览器或HTTP实现，渲染器、提供方和投递方都通过特质注入。
pub mod models;
pub mod services;
