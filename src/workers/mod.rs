// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 负责一次审计运行的分批调度、超时控制与结果汇总
pub mod crawl_orchestrator;

pub use crawl_orchestrator::{BatchReport, CrawlOrchestrator, RunState, RunSummary};
