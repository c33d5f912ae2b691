use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::configuration::OrderSettings;

use super::Quantity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineTotals{
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderTotals{
    pub lines: Vec<LineTotals>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal
}

/// Rounds to whole cents, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal{
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prices one vendor's share of a checkout. Tax is charged per line at the
/// configured rate; shipping is waived once the subtotal reaches the
/// free-shipping threshold.
pub fn price_order(lines: &[(Decimal, Quantity)], settings: &OrderSettings) -> OrderTotals{
    let lines: Vec<LineTotals> = lines.iter()
        .map(|(unit_price, quantity)| {
            let subtotal = round_money(*unit_price * Decimal::from(quantity.get()));
            let tax = round_money(subtotal * settings.tax_rate);
            LineTotals{
                unit_price: *unit_price,
                quantity: quantity.get(),
                subtotal,
                tax,
                total: subtotal + tax
            }
        })
        .collect();

    let subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
    let tax: Decimal = lines.iter().map(|l| l.tax).sum();
    let shipping_cost = if lines.is_empty() || subtotal >= settings.free_shipping_threshold {
        Decimal::ZERO
    } else {
        settings.shipping_fee
    };
    let discount = Decimal::ZERO;

    OrderTotals{
        lines,
        subtotal,
        tax,
        shipping_cost,
        discount,
        total: subtotal + tax + shipping_cost - discount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(amount: &str) -> Decimal{
        amount.parse().unwrap()
    }

    fn settings() -> OrderSettings{
        OrderSettings{
            tax_rate: money("0.15"),
            shipping_fee: money("500"),
            free_shipping_threshold: money("5000"),
            max_order_amount: money("1000000")
        }
    }

    fn qty(n: i32) -> Quantity{
        Quantity::parse(n).unwrap()
    }

    #[test]
    fn small_orders_pay_shipping(){
        let totals = price_order(&[(money("1000"), qty(2))], &settings());

        assert_eq!(totals.subtotal, money("2000"));
        assert_eq!(totals.tax, money("300"));
        assert_eq!(totals.shipping_cost, money("500"));
        assert_eq!(totals.total, money("2800"));
    }

    #[test]
    fn shipping_is_free_at_the_threshold(){
        let totals = price_order(&[(money("2500"), qty(1)), (money("1250"), qty(2))], &settings());

        assert_eq!(totals.subtotal, money("5000"));
        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.total, money("5750"));
    }

    #[test]
    fn line_taxes_add_up_to_the_order_tax(){
        let totals = price_order(&[(money("99.99"), qty(3)), (money("0.35"), qty(7))], &settings());

        assert_eq!(totals.lines[0].tax, money("45.00"));
        assert_eq!(totals.lines[1].tax, money("0.37"));
        assert_eq!(totals.tax, money("45.37"));
        assert_eq!(totals.total, totals.subtotal + totals.tax + totals.shipping_cost);
    }

    #[test]
    fn cents_sum_exactly(){
        let totals = price_order(&[(money("0.10"), qty(1)), (money("0.20"), qty(1))], &settings());

        assert_eq!(totals.subtotal, money("0.30"));
    }

    #[test]
    fn half_cents_round_away_from_zero(){
        assert_eq!(round_money(money("2.345")), money("2.35"));
        assert_eq!(round_money(money("-2.345")), money("-2.35"));
        assert_eq!(round_money(money("2.344")), money("2.34"));
    }
}
