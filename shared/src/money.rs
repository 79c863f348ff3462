//! Money helpers
//!
//! Amounts travel as `f64` VND to match the storefront API; every
//! aggregation rounds to two decimals so repeated recomputation stays
//! stable.

/// Round an amount to two decimal places.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum price × quantity over `(product_id, price, quantity)` lines.
///
/// Lines with a negative price or zero quantity are skipped with a
/// warning instead of poisoning the total; the result is floored at
/// zero and rounded to two decimals. Persisted guest state can arrive
/// corrupted, so this never errors.
pub fn cart_total<'a, I>(lines: I) -> f64
where
    I: IntoIterator<Item = (&'a str, f64, u32)>,
{
    let mut total = 0.0;
    for (product_id, price, quantity) in lines {
        if price < 0.0 || quantity == 0 {
            tracing::warn!(
                product_id = %product_id,
                price,
                quantity,
                "skipping corrupt cart line while totaling"
            );
            continue;
        }
        total += price * quantity as f64;
    }
    round_money(total.max(0.0))
}

/// Format an amount as Vietnamese đồng for display, e.g. `1.250.000₫`.
///
/// VND carries no decimal places; the amount is rounded to the whole
/// đồng and grouped with dots.
pub fn format_vnd(amount: f64) -> String {
    let value = amount.round() as i64;
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}₫")
    } else {
        format!("{grouped}₫")
    }
}
