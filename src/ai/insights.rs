//! One-shot business report for the AI Manager screen.

use log::error;
use rust_decimal::Decimal;

use super::{GenerateRequest, GenerativeModel};
use crate::{
    models::{Product, Transaction},
    receipt::format_date,
};

pub const NO_ANALYSIS: &str = "No analysis generated.";
pub const UNAVAILABLE: &str =
    "Unable to generate insights at this time. Please ensure your API key is configured correctly.";

/// How many of the most recent sales go into the prompt.
const RECENT_SALES: usize = 20;

/// `transactions` is expected newest first, as the repository lists them.
pub fn build_prompt(products: &[Product], transactions: &[Transaction]) -> String {
    let inventory_summary = products
        .iter()
        .map(|p| format!("{} (Stock: {})", p.name, p.stock))
        .collect::<Vec<_>>()
        .join(", ");

    let total_revenue: Decimal = transactions.iter().map(|t| t.total).sum();

    let sales_summary = transactions
        .iter()
        .take(RECENT_SALES)
        .map(|t| {
            let names = t.items.iter().map(|i| i.product.name.as_str()).collect::<Vec<_>>().join(", ");
            format!("Date: {}, Items: {}, Total: {}", format_date(t.timestamp), names, t.total)
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        r#"You are an expert pharmacy business consultant. Analyze the following data for a small pharmacy.

Current Inventory:
{inventory_summary}

Recent Sales History (Last {RECENT_SALES} transactions):
{sales_summary}

Total Historical Revenue: {total_revenue}

Please provide a response in Markdown format with the following sections:
1. **Sales Trends**: What is selling well?
2. **Restock Recommendations**: Which items are critically low or selling fast?
3. **Business Tip**: A specific piece of advice to improve sales or management based on this data.

Keep it concise, professional, and actionable."#
    )
}

/// Never fails: model errors degrade to a fixed message.
pub async fn generate_insights(
    model: &dyn GenerativeModel,
    products: &[Product],
    transactions: &[Transaction],
) -> String {
    let prompt = build_prompt(products, transactions);
    match model.generate(GenerateRequest::prompt(prompt)).await {
        Ok(response) if response.text.trim().is_empty() => NO_ANALYSIS.to_string(),
        Ok(response) => response.text,
        Err(e) => {
            error!("Insights generation failed: {}", e);
            UNAVAILABLE.to_string()
        }
    }
}
