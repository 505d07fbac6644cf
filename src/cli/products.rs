use super::ui;
use crate::core::CatalogService;
use crate::core::listing::describe;
use crate::core::query::ListingQuery;
use crate::core::service::Listing;
use anyhow::Result;
use comfy_table::Cell;

impl Listing {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Name"),
            ui::header_cell("Weight (g)"),
            ui::header_cell("Rating"),
            ui::header_cell("Price (USD)"),
        ]);

        for item in &self.items {
            table.add_row(vec![
                Cell::new(item.id),
                Cell::new(&item.name),
                Cell::new(format!("{:.2}", item.weight)),
                ui::rating_cell(item.popularity_rating),
                ui::price_cell(item.price),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text(
                &describe(self.query.sort_by, self.query.sort_order, self.items.len()),
                ui::StyleType::Title
            )
        );
        output.push_str(&table.to_string());

        let source = if self.quote.is_live() {
            ui::style_text(&self.quote.origin.to_string(), ui::StyleType::Subtle)
        } else {
            ui::style_text("fallback price", ui::StyleType::Warning)
        };
        output.push_str(&format!(
            "\n\n{} {} of {} products, gold at {} per gram ({})",
            ui::style_text("Matched:", ui::StyleType::Label),
            self.filtered_count(),
            self.total_items,
            ui::style_text(&format!("${:.2}", self.quote.price), ui::StyleType::Value),
            source
        ));
        output
    }
}

pub async fn run(service: &CatalogService, query: ListingQuery) -> Result<()> {
    let spinner = ui::new_spinner("Resolving gold price...");
    let listing = service.list(query).await;
    spinner.finish_and_clear();

    let listing = listing?;
    if listing.items.is_empty() {
        println!("No products match the given filters.");
        return Ok(());
    }
    println!("{}", listing.display_as_table());
    Ok(())
}
