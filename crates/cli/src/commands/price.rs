//! One-shot SOL price lookup.

use std::io::Write;

use cartoon_cart_core::Price;
use cartoon_cart_storefront::config::StorefrontConfig;
use cartoon_cart_storefront::services::http_client;
use cartoon_cart_storefront::services::price_feed::{
    PriceFeedClient, PricePoller, PriceSource, PriceTicker, Quote, QuoteSource, Trend,
};

/// Fetch the price once, printing the fallback if the feed is unavailable.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built or output fails.
pub async fn fetch(
    out: &mut impl Write,
    config: &StorefrontConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = PriceFeedClient::new(http_client()?, config.price_feed.url.clone());
    let quote = quote_once(source, config).await;
    write_quote(out, &quote)?;
    Ok(())
}

async fn quote_once<S: PriceSource>(source: S, config: &StorefrontConfig) -> Quote {
    PricePoller::new(
        source,
        PriceTicker::new(),
        config.price_feed.poll_interval,
        config.price_feed.fallback_usd,
    )
    .poll_once()
    .await
}

fn write_quote(out: &mut impl Write, quote: &Quote) -> std::io::Result<()> {
    let trend = match quote.trend {
        Trend::Up => "up",
        Trend::Down => "down",
    };
    let source = match quote.source {
        QuoteSource::Live => "live",
        QuoteSource::Fallback => "fallback",
    };
    writeln!(
        out,
        "1 SOL = {} ({source}, trend {trend})",
        Price::usd(quote.sol_usd)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartoon_cart_storefront::services::price_feed::PriceFeedError;
    use rust_decimal::Decimal;

    use super::*;

    struct Down;

    impl PriceSource for Down {
        async fn fetch_sol_usd(&self) -> Result<Decimal, PriceFeedError> {
            Err(PriceFeedError::Status(503))
        }
    }

    struct Fixed(Decimal);

    impl PriceSource for Fixed {
        async fn fetch_sol_usd(&self) -> Result<Decimal, PriceFeedError> {
            Ok(self.0)
        }
    }

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|_| None).unwrap()
    }

    fn printed(quote: &Quote) -> String {
        let mut buf = Vec::new();
        write_quote(&mut buf, quote).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_fallback_quote() {
        let quote = quote_once(Down, &config()).await;
        assert_eq!(printed(&quote), "1 SOL = $145.32 (fallback, trend up)\n");
    }

    #[tokio::test]
    async fn test_live_quote() {
        let quote = quote_once(Fixed(Decimal::new(13810, 2)), &config()).await;
        assert_eq!(printed(&quote), "1 SOL = $138.10 (live, trend down)\n");
    }
}
