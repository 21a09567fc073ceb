use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{product, voucher_line, voucher_order};
use crate::validation::MONEY_DECIMAL_PLACES;

/// Normalises a monetary amount to two decimal places (`300` -> `300.00`).
pub fn money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(MONEY_DECIMAL_PLACES);
    value.rescale(MONEY_DECIMAL_PLACES);
    value
}

/// Sum of product prices. An order without products totals `0.00`.
pub fn total_price<'a, I>(prices: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    money(prices.into_iter().copied().sum())
}

/// Amount still owed on a voucher. Negative when overpaid.
pub fn rest_amount(orders_total_price: Decimal, voucher_lines_total_amount: Decimal) -> Decimal {
    money(orders_total_price - voucher_lines_total_amount)
}

/// Derived payment position of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoucherBalance {
    /// Sum of the total prices of every linked order
    #[schema(value_type = String, example = "300.00")]
    pub orders_total_price: Decimal,
    /// Sum of all installment amounts
    #[schema(value_type = String, example = "250.00")]
    pub voucher_lines_total_amount: Decimal,
    /// `orders_total_price - voucher_lines_total_amount`
    #[schema(value_type = String, example = "50.00")]
    pub rest_amount: Decimal,
}

impl VoucherBalance {
    pub fn compute<'a, P, L>(product_prices: P, line_amounts: L) -> Self
    where
        P: IntoIterator<Item = &'a Decimal>,
        L: IntoIterator<Item = &'a Decimal>,
    {
        let orders_total_price = total_price(product_prices);
        let voucher_lines_total_amount = money(line_amounts.into_iter().copied().sum());
        Self {
            orders_total_price,
            voucher_lines_total_amount,
            rest_amount: rest_amount(orders_total_price, voucher_lines_total_amount),
        }
    }
}

/// Total price of a single order.
pub async fn order_total_price<C>(db: &C, order_id: i32) -> Result<Decimal, DbErr>
where
    C: ConnectionTrait,
{
    let prices: Vec<Decimal> = product::Entity::find()
        .select_only()
        .column(product::Column::Price)
        .filter(product::Column::OrderId.eq(order_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(total_price(&prices))
}

/// Total prices for a batch of orders. Orders without products map to `0.00`.
pub async fn order_totals<C>(db: &C, order_ids: &[i32]) -> Result<HashMap<i32, Decimal>, DbErr>
where
    C: ConnectionTrait,
{
    let mut totals: HashMap<i32, Decimal> = order_ids
        .iter()
        .map(|id| (*id, Decimal::ZERO))
        .collect();
    if order_ids.is_empty() {
        return Ok(totals);
    }

    let rows: Vec<(i32, Decimal)> = product::Entity::find()
        .select_only()
        .column(product::Column::OrderId)
        .column(product::Column::Price)
        .filter(product::Column::OrderId.is_in(order_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    for (order_id, price) in rows {
        *totals.entry(order_id).or_insert(Decimal::ZERO) += price;
    }

    Ok(totals
        .into_iter()
        .map(|(id, total)| (id, money(total)))
        .collect())
}

/// Balance of one voucher computed from its linked orders and installments.
pub async fn voucher_balance<C>(db: &C, voucher_id: i32) -> Result<VoucherBalance, DbErr>
where
    C: ConnectionTrait,
{
    let order_ids: Vec<i32> = voucher_order::Entity::find()
        .select_only()
        .column(voucher_order::Column::OrderId)
        .filter(voucher_order::Column::VoucherId.eq(voucher_id))
        .into_tuple()
        .all(db)
        .await?;

    let prices: Vec<Decimal> = if order_ids.is_empty() {
        Vec::new()
    } else {
        product::Entity::find()
            .select_only()
            .column(product::Column::Price)
            .filter(product::Column::OrderId.is_in(order_ids))
            .into_tuple()
            .all(db)
            .await?
    };

    let amounts: Vec<Decimal> = voucher_line::Entity::find()
        .select_only()
        .column(voucher_line::Column::Amount)
        .filter(voucher_line::Column::VoucherId.eq(voucher_id))
        .into_tuple()
        .all(db)
        .await?;

    Ok(VoucherBalance::compute(&prices, &amounts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_always_has_two_places() {
        assert_eq!(money(dec!(300)).to_string(), "300.00");
        assert_eq!(money(dec!(12.345)).to_string(), "12.34");
        assert_eq!(money(dec!(0)).to_string(), "0.00");
    }

    #[test]
    fn empty_order_totals_zero() {
        let none: [Decimal; 0] = [];
        assert_eq!(total_price(&none).to_string(), "0.00");
    }

    #[test]
    fn total_price_sums_products() {
        let prices = [dec!(100.00), dec!(200.00)];
        assert_eq!(total_price(&prices), dec!(300.00));
    }

    #[test]
    fn balance_across_orders_and_lines() {
        // two orders (300.00 + 50.00) paid with 200.00 + 100.00
        let prices = [dec!(100.00), dec!(200.00), dec!(50.00)];
        let amounts = [dec!(200.00), dec!(100.00)];
        let balance = VoucherBalance::compute(&prices, &amounts);
        assert_eq!(balance.orders_total_price, dec!(350.00));
        assert_eq!(balance.voucher_lines_total_amount, dec!(300.00));
        assert_eq!(balance.rest_amount, dec!(50.00));
    }

    #[test]
    fn overpayment_goes_negative() {
        let balance = VoucherBalance::compute(&[dec!(80.00)], &[dec!(100.00)]);
        assert_eq!(balance.rest_amount, dec!(-20.00));
    }

    #[test]
    fn voucher_without_anything_is_zero() {
        let none: [Decimal; 0] = [];
        let balance = VoucherBalance::compute(&none, &none);
        assert_eq!(balance.rest_amount.to_string(), "0.00");
    }
}
