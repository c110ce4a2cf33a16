// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::FakeRenderer;
use image::{ImageFormat, Rgb, RgbImage};
use imgaudit::config::settings::{CrawlSettings, ImageSettings, SinkSettings};
use imgaudit::domain::services::page_analyzer::PageAnalyzer;
use imgaudit::engines::image_fetcher::ImageFetcher;
use imgaudit::engines::render_limiter::{LimitedRenderer, RenderLimiter};
use imgaudit::infrastructure::services::result_sink_impl::WebhookResultSink;
use imgaudit::infrastructure::services::url_provider_impl::HttpUrlProvider;
use imgaudit::workers::CrawlOrchestrator;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 32, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

async fn serve_image(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// 提供方、页面图片与投递端点都由同一个mock服务器承担
#[tokio::test]
async fn test_full_run_against_http_provider_and_webhook() {
    let server = MockServer::start().await;
    let base = server.uri();
    let product = format!("{}/product/1", base);
    let about = format!("{}/about", base);

    Mock::given(method("GET"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "urls": [product.clone(), about.clone()]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    serve_image(&server, "/img/front.png", png([0, 0, 0])).await;
    serve_image(&server, "/img/back.png", png([0, 0, 0])).await;
    serve_image(&server, "/img/side.png", png([255, 255, 255])).await;
    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut pages = HashMap::new();
    pages.insert(
        product.clone(),
        format!(
            r#"<html><body>
                <img src="{base}/img/front.png">
                <img src="{base}/img/back.png">
                <img src="{base}/img/side.png">
                <img src="{base}/img/gone.png">
                <img src="{base}/img/icon.svg">
            </body></html>"#
        ),
    );
    pages.insert(about.clone(), "<html><body>about us</body></html>".to_string());

    let image = ImageSettings::default();
    let crawl = CrawlSettings::default();
    let renderer = Arc::new(LimitedRenderer::new(
        Arc::new(FakeRenderer::with_pages(pages)),
        RenderLimiter::new(crawl.concurrency_limit),
    ));
    let analyzer = Arc::new(PageAnalyzer::new(
        renderer,
        ImageFetcher::new(image.clone()).unwrap(),
        &image,
    ));
    let orch = CrawlOrchestrator::new(
        Arc::new(HttpUrlProvider::new(
            format!("{}/pages", base),
            Duration::from_secs(5),
        )),
        Arc::new(WebhookResultSink::new(
            format!("{}/results", base),
            Duration::from_secs(5),
            None,
        )),
        analyzer,
        crawl,
        SinkSettings::default(),
    );

    let summary = orch.run().await.expect("run should succeed");
    assert_eq!(summary.delivered, 2);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.url.path() == "/results")
        .expect("results posted");
    let body: Value = serde_json::from_slice(&post.body).unwrap();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);

    let product_record = &records[0];
    assert_eq!(product_record["url"], product.as_str());
    assert_eq!(product_record["broken"], format!("{}/img/gone.png", base));
    assert_eq!(product_record["placeholder"], "Geen");
    assert_eq!(product_record["duplicate"], format!("{}/img/back.png", base));

    let details = product_record["blur_details"].as_array().unwrap();
    assert_eq!(details.len(), 4);
    assert_eq!(details[0]["image_url"], format!("{}/img/front.png", base));
    assert_eq!(details[0]["sharpness"], "Blurry");
    assert_eq!(details[0]["resolution_check"], "Too Small");
    assert_eq!(details[0]["width"], 32);
    assert!(details[3]["error"].is_string());

    let about_record = &records[1];
    assert_eq!(about_record["url"], about.as_str());
    assert_eq!(about_record["broken"], "Geen");
    assert_eq!(about_record["duplicate"], "Geen");
    assert!(about_record["blur_details"].as_array().unwrap().is_empty());

    // no image was requested for the svg
    assert!(!requests.iter().any(|r| r.url.path().ends_with(".svg")));
}
