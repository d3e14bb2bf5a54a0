//! Integration tests for SOL price polling and conversion.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use cartoon_cart_integration_tests::{SOL_USD, TestContext};
use cartoon_cart_storefront::services::http_client;
use cartoon_cart_storefront::services::price_feed::{
    PriceFeedClient, PricePoller, PriceTicker, QuoteSource, Trend,
};
use serde_json::json;
use url::Url;

fn poller(ctx: &TestContext, url: Url) -> PricePoller<PriceFeedClient> {
    PricePoller::new(
        PriceFeedClient::new(http_client().unwrap(), url),
        ctx.state.ticker().clone(),
        Duration::from_millis(50),
        ctx.state.config().price_feed.fallback_usd,
    )
}

#[tokio::test]
async fn test_ticker_before_first_poll() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/ticker").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "1 SOL = ...");
    assert!(body["quote"].is_null());
}

#[tokio::test]
async fn test_live_quote_converts_prices() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.state.config().price_feed.url, ctx.config.price_feed.url);
    let quote = poller(&ctx, ctx.state.config().price_feed.url.clone())
        .poll_once()
        .await;
    assert_eq!(quote.source, QuoteSource::Live);
    assert_eq!(quote.trend, Trend::Up);

    let (_, ticker) = ctx.get("/ticker").await;
    assert_eq!(ticker["label"], "1 SOL = $150.25");
    assert_eq!(ticker["quote"]["solUsd"], SOL_USD);
    assert_eq!(ticker["quote"]["source"], "live");
    assert_eq!(ticker["quote"]["trend"], "up");

    // 2.50 / 150.25
    let (_, baguette) = ctx.get("/products/1").await;
    assert_eq!(baguette["solPrice"], "0.0166 SOL");

    let (_, cart) = ctx.post("/cart/add", &json!({ "productId": 1 })).await;
    assert_eq!(cart["solTotal"], "0.0166 SOL");
}

#[tokio::test]
async fn test_broken_feed_uses_fallback() {
    let ctx = TestContext::new().await;
    let url = Url::parse(&ctx.collaborators.url("price/broken")).unwrap();
    let quote = poller(&ctx, url).poll_once().await;
    assert_eq!(quote.source, QuoteSource::Fallback);
    assert_eq!(quote.sol_usd, ctx.config.price_feed.fallback_usd);

    let (_, ticker) = ctx.get("/ticker").await;
    assert_eq!(ticker["label"], "1 SOL = $145.32");
    assert_eq!(ticker["quote"]["source"], "fallback");
}

#[tokio::test]
async fn test_poller_start_and_stop() {
    let ctx = TestContext::new().await;
    let ticker: PriceTicker = ctx.state.ticker().clone();
    let handle = poller(&ctx, ctx.config.price_feed.url.clone()).start();

    for _ in 0..50 {
        if ticker.current().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(ticker.label(), "1 SOL = $150.25");
    assert!(!handle.is_finished());

    handle.stop().await;

    // The last quote stays published after shutdown
    assert!(ticker.current().is_some());
}
