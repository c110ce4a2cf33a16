// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus导出器与指标名称
/// - 服务实现（services）：URL提供方与结果投递的HTTP和文件实现
///
/// 基础设施层依赖领域层的特质，领域层不感知具体实现。
pub mod metrics;
pub mod services;
