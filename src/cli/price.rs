use super::ui;
use crate::core::{CatalogService, PriceQuote};
use anyhow::Result;

pub fn format_quote(quote: &PriceQuote) -> String {
    let freshness = if quote.cached {
        format!("cached, {}s old", quote.age_secs())
    } else {
        "just fetched".to_string()
    };
    format!(
        "{} {} per gram (24k)\n{} {} ({})",
        ui::style_text("Gold:", ui::StyleType::Label),
        ui::style_text(&format!("${:.2}", quote.price), ui::StyleType::Value),
        ui::style_text("Source:", ui::StyleType::Label),
        quote.origin,
        freshness
    )
}

pub async fn run(service: &CatalogService) -> Result<()> {
    let spinner = ui::new_spinner("Resolving gold price...");
    let quote = service.gold_price().await;
    spinner.finish_and_clear();

    println!("{}", format_quote(&quote));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PriceOrigin;
    use std::time::Duration;

    #[test]
    fn test_format_quote() {
        console::set_colors_enabled(false);
        let quote = PriceQuote {
            price: 85.2134,
            origin: PriceOrigin::Live("GoldAPI.io".to_string()),
            cached: true,
            age: Some(Duration::from_secs(12)),
        };
        assert_eq!(
            format_quote(&quote),
            "Gold: $85.21 per gram (24k)\nSource: GoldAPI.io (cached, 12s old)"
        );
    }
}
