// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供URL提供方与结果投递的具体实现
pub mod result_sink_impl;
pub mod url_provider_impl;
