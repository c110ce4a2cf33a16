// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置文件和环境变量
pub mod config;

/// 领域模块
///
/// 包含页面与图片的领域模型、质量分类和重复检测等核心逻辑
pub mod domain;

/// 引擎模块
///
/// 页面渲染、渲染限流与图片下载
pub mod engines;

/// 基础设施模块
///
/// 指标导出以及URL提供方、结果投递的具体实现
pub mod infrastructure;

/// 工具模块
///
/// 错误类型、日志初始化与URL处理
pub mod utils;

/// 工作器模块
///
/// 审计运行的分批编排
pub mod workers;
