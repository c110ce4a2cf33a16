// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{orchestrator, page_urls, FakeRenderer, RecordingSink};
use imgaudit::config::settings::{CrawlSettings, ImageSettings, SinkSettings};
use imgaudit::utils::errors::AuditError;
use imgaudit::workers::RunState;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_batches_split_and_render_limit_holds() {
    let renderer = Arc::new(FakeRenderer::default());
    let sink = Arc::new(RecordingSink::default());
    let orch = orchestrator(
        page_urls(23),
        renderer.clone(),
        sink.clone(),
        CrawlSettings::default(),
        SinkSettings::default(),
        ImageSettings::default(),
    );

    let summary = orch.run().await.expect("run should succeed");

    let sizes: Vec<usize> = summary.batches.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![10, 10, 3]);
    assert_eq!(summary.verdicts.len(), 23);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 23);
    assert!(renderer.peak.load(Ordering::SeqCst) <= 5);
    assert!(renderer.peak.load(Ordering::SeqCst) >= 2);

    assert_eq!(sink.delivery_count(), 1);
    let delivered = sink.last().unwrap();
    assert_eq!(delivered.len(), 23);
    assert_eq!(delivered[0].url, "https://shop.example.com/p/0");
    assert_eq!(delivered[0].broken, "Geen");
    assert_eq!(summary.delivered, 23);
    assert_eq!(orch.state(), RunState::Done);
}

#[tokio::test]
async fn test_empty_provider_list_is_fatal_and_sink_untouched() {
    let sink = Arc::new(RecordingSink::default());
    let orch = orchestrator(
        Vec::new(),
        Arc::new(FakeRenderer::default()),
        sink.clone(),
        CrawlSettings::default(),
        SinkSettings::default(),
        ImageSettings::default(),
    );
    assert_eq!(orch.state(), RunState::Idle);

    let result = orch.run().await;

    assert!(matches!(result, Err(AuditError::NoTargets)));
    assert_eq!(sink.delivery_count(), 0);
    assert_eq!(orch.state(), RunState::Failed);
}

#[tokio::test]
async fn test_failed_page_yields_empty_verdict_without_affecting_others() {
    let renderer = Arc::new(FakeRenderer::default());
    let sink = Arc::new(RecordingSink::default());
    let urls = vec![
        "https://shop.example.com/p/1".to_string(),
        "https://fail.example.com/p/2".to_string(),
        "https://shop.example.com/p/3".to_string(),
    ];
    let orch = orchestrator(
        urls,
        renderer,
        sink.clone(),
        CrawlSettings::default(),
        SinkSettings::default(),
        ImageSettings::default(),
    );

    let summary = orch.run().await.unwrap();

    assert_eq!(summary.batches.len(), 1);
    assert_eq!(summary.batches[0].analyzed, 2);
    assert_eq!(summary.batches[0].failed, 1);
    let failed = &summary.verdicts[1];
    assert_eq!(failed.url, "https://fail.example.com/p/2");
    assert!(!failed.has_issues());

    let delivered = sink.last().unwrap();
    assert_eq!(delivered.len(), 3);
    assert_eq!(delivered[1].placeholder, "Geen");
    assert!(delivered[1].blur_details.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_page_is_recorded_and_dropped() {
    let renderer = Arc::new(FakeRenderer::default());
    let sink = Arc::new(RecordingSink::default());
    let urls = vec![
        "https://shop.example.com/p/1".to_string(),
        "https://slow.example.com/p/2".to_string(),
        "https://shop.example.com/p/3".to_string(),
    ];
    let crawl = CrawlSettings {
        task_timeout_secs: 2,
        ..CrawlSettings::default()
    };
    let orch = orchestrator(
        urls,
        renderer,
        sink.clone(),
        crawl,
        SinkSettings::default(),
        ImageSettings::default(),
    );

    let summary = orch.run().await.unwrap();

    assert_eq!(
        summary.batches[0].timed_out,
        vec!["https://slow.example.com/p/2".to_string()]
    );
    assert_eq!(summary.batches[0].analyzed, 2);
    let urls: Vec<&str> = summary.verdicts.iter().map(|v| v.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://shop.example.com/p/1", "https://shop.example.com/p/3"]
    );
    assert_eq!(sink.last().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_and_repeated_urls_are_collapsed() {
    let renderer = Arc::new(FakeRenderer::default());
    let sink = Arc::new(RecordingSink::default());
    let urls = vec![
        "https://shop.example.com/p/1".to_string(),
        "not a url".to_string(),
        " https://shop.example.com/p/1 ".to_string(),
        "https://shop.example.com/p/2".to_string(),
    ];
    let orch = orchestrator(
        urls,
        renderer.clone(),
        sink,
        CrawlSettings::default(),
        SinkSettings::default(),
        ImageSettings::default(),
    );

    let summary = orch.run().await.unwrap();

    assert_eq!(summary.verdicts.len(), 2);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clean_pages_filtered_when_configured() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://shop.example.com/p/1".to_string(),
        r#"<img src="https://shop.example.com/img/no_image.png">"#.to_string(),
    );
    let renderer = Arc::new(FakeRenderer::with_pages(pages));
    let sink = Arc::new(RecordingSink::default());
    let sink_settings = SinkSettings {
        report_clean_pages: false,
        none_sentinel: String::new(),
        ..SinkSettings::default()
    };
    let image = ImageSettings {
        quality_checks: false,
        ..ImageSettings::default()
    };
    let orch = orchestrator(
        page_urls(3),
        renderer,
        sink.clone(),
        CrawlSettings::default(),
        sink_settings,
        image,
    );

    let summary = orch.run().await.unwrap();

    assert_eq!(summary.verdicts.len(), 3);
    assert_eq!(summary.delivered, 1);
    let delivered = sink.last().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].url, "https://shop.example.com/p/1");
    assert_eq!(
        delivered[0].placeholder,
        "https://shop.example.com/img/no_image.png"
    );
    assert_eq!(delivered[0].broken, "");
}

#[tokio::test]
async fn test_no_sink_call_when_nothing_to_report() {
    let sink = Arc::new(RecordingSink::default());
    let sink_settings = SinkSettings {
        report_clean_pages: false,
        ..SinkSettings::default()
    };
    let orch = orchestrator(
        page_urls(4),
        Arc::new(FakeRenderer::default()),
        sink.clone(),
        CrawlSettings::default(),
        sink_settings,
        ImageSettings::default(),
    );

    let summary = orch.run().await.unwrap();

    assert_eq!(summary.delivered, 0);
    assert_eq!(sink.delivery_count(), 0);
    assert_eq!(orch.state(), RunState::Done);
}

#[tokio::test]
async fn test_sink_failure_fails_run_without_retry() {
    let sink = Arc::new(RecordingSink::failing());
    let orch = orchestrator(
        page_urls(2),
        Arc::new(FakeRenderer::default()),
        sink.clone(),
        CrawlSettings::default(),
        SinkSettings::default(),
        ImageSettings::default(),
    );

    let result = orch.run().await;

    assert!(matches!(result, Err(AuditError::Delivery(_))));
    assert_eq!(sink.delivery_count(), 1);
    assert_eq!(orch.state(), RunState::Failed);
}
