use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::voucher::PaymentMethod;
use crate::entities::{identity, order, voucher, voucher_line, voucher_order};
use crate::errors::ServiceError;
use crate::services::orders::ensure_order_exists;
use crate::services::pricing::{self, VoucherBalance};
use crate::validation::{validate_payment_amount, FieldErrors};

/// Payment arrangements covering one or more orders, paid in installments.
#[derive(Clone)]
pub struct VoucherService {
    db: Arc<DatabaseConnection>,
}

impl VoucherService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a voucher and links the given orders in one transaction.
    #[instrument(skip(self))]
    pub async fn create_voucher(
        &self,
        input: CreateVoucherInput,
    ) -> Result<VoucherDetail, ServiceError> {
        let order_ids: BTreeSet<i32> = input.order_ids.iter().copied().collect();

        let txn = self.db.begin().await?;

        let mut errors = FieldErrors::new();
        for order_id in &order_ids {
            if order::Entity::find_by_id(*order_id).count(&txn).await? == 0 {
                errors.add("order_ids", format!("Order {} does not exist", order_id));
            }
        }
        if !errors.is_empty() {
            txn.rollback().await?;
            return Err(errors.into());
        }

        let created = voucher::ActiveModel {
            payment_method: Set(input.payment_method),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for order_id in &order_ids {
            voucher_order::ActiveModel {
                voucher_id: Set(created.id),
                order_id: Set(*order_id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(
            voucher_id = created.id,
            payment_method = %created.payment_method,
            orders = order_ids.len(),
            "Created voucher"
        );
        self.get_voucher(created.id).await
    }

    #[instrument(skip(self))]
    pub async fn list_vouchers(
        &self,
        payment_method: Option<PaymentMethod>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<VoucherSummary>, u64), ServiceError> {
        let mut query = voucher::Entity::find();
        if let Some(method) = payment_method {
            query = query.filter(voucher::Column::PaymentMethod.eq(method));
        }

        let total = query.clone().count(&*self.db).await?;
        let vouchers = query
            .order_by_desc(voucher::Column::CreatedAt)
            .order_by_desc(voucher::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        let mut rows = Vec::with_capacity(vouchers.len());
        for v in vouchers {
            let order_ids = linked_order_ids(&*self.db, v.id).await?;
            let balance = pricing::voucher_balance(&*self.db, v.id).await?;
            rows.push(VoucherSummary {
                id: v.id,
                payment_method: v.payment_method,
                created_at: v.created_at,
                order_ids,
                balance,
            });
        }
        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_voucher(&self, id: i32) -> Result<VoucherDetail, ServiceError> {
        let db = &*self.db;
        let model = find_voucher(db, id).await?;

        let order_ids = linked_order_ids(db, id).await?;
        let orders = if order_ids.is_empty() {
            Vec::new()
        } else {
            order::Entity::find()
                .filter(order::Column::Id.is_in(order_ids.clone()))
                .order_by_asc(order::Column::Id)
                .all(db)
                .await?
        };
        let totals = pricing::order_totals(db, &order_ids).await?;
        let names: HashMap<i32, String> = if order_ids.is_empty() {
            HashMap::new()
        } else {
            identity::Entity::find()
                .filter(identity::Column::OrderId.is_in(order_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|i| (i.order_id, i.full_name()))
                .collect()
        };

        let lines = voucher_line::Entity::find()
            .filter(voucher_line::Column::VoucherId.eq(id))
            .order_by_asc(voucher_line::Column::PaymentDate)
            .order_by_asc(voucher_line::Column::Id)
            .all(db)
            .await?;

        let line_amounts: Vec<Decimal> = lines.iter().map(|l| l.amount).collect();
        let balance = VoucherBalance::compute(totals.values(), &line_amounts);

        Ok(VoucherDetail {
            id: model.id,
            payment_method: model.payment_method,
            created_at: model.created_at,
            orders: orders
                .into_iter()
                .map(|o| VoucherOrderView {
                    order_id: o.id,
                    reference: o.reference(),
                    customer_name: names.get(&o.id).cloned(),
                    total_price: totals.get(&o.id).copied().unwrap_or(Decimal::ZERO),
                })
                .collect(),
            lines: lines.into_iter().map(VoucherLineView::from).collect(),
            balance,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_voucher(
        &self,
        id: i32,
        input: UpdateVoucherInput,
    ) -> Result<VoucherDetail, ServiceError> {
        let model = find_voucher(&*self.db, id).await?;
        let mut active: voucher::ActiveModel = model.into();
        active.payment_method = Set(input.payment_method);
        active.update(&*self.db).await?;
        info!(voucher_id = id, payment_method = %input.payment_method, "Updated voucher");
        self.get_voucher(id).await
    }

    /// Deletes the voucher with its lines and order links; orders stay.
    #[instrument(skip(self))]
    pub async fn delete_voucher(&self, id: i32) -> Result<(), ServiceError> {
        let result = voucher::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Voucher", id));
        }
        info!(voucher_id = id, "Deleted voucher");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn link_order(
        &self,
        voucher_id: i32,
        order_id: i32,
    ) -> Result<VoucherBalance, ServiceError> {
        find_voucher(&*self.db, voucher_id).await?;
        ensure_order_exists(&*self.db, order_id).await?;

        let already = voucher_order::Entity::find_by_id((voucher_id, order_id))
            .count(&*self.db)
            .await?;
        if already > 0 {
            return Err(ServiceError::Conflict(format!(
                "Order {} is already linked to voucher {}",
                order_id, voucher_id
            )));
        }

        voucher_order::ActiveModel {
            voucher_id: Set(voucher_id),
            order_id: Set(order_id),
        }
        .insert(&*self.db)
        .await?;

        info!(voucher_id, order_id, "Linked order to voucher");
        Ok(pricing::voucher_balance(&*self.db, voucher_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn unlink_order(
        &self,
        voucher_id: i32,
        order_id: i32,
    ) -> Result<VoucherBalance, ServiceError> {
        let result = voucher_order::Entity::delete_by_id((voucher_id, order_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Order {} is not linked to voucher {}",
                order_id, voucher_id
            )));
        }
        info!(voucher_id, order_id, "Unlinked order from voucher");
        Ok(pricing::voucher_balance(&*self.db, voucher_id).await?)
    }

    /// Records an installment.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        voucher_id: i32,
        input: VoucherLineInput,
    ) -> Result<VoucherLineView, ServiceError> {
        input.validate()?;
        find_voucher(&*self.db, voucher_id).await?;

        let created = voucher_line::ActiveModel {
            voucher_id: Set(voucher_id),
            amount: Set(input.amount),
            payment_date: Set(input.payment_date),
            payment_ref: Set(input
                .payment_ref
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(voucher_id, line_id = created.id, amount = %created.amount, "Added voucher line");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn remove_line(&self, voucher_id: i32, line_id: i32) -> Result<(), ServiceError> {
        let result = voucher_line::Entity::delete_many()
            .filter(voucher_line::Column::Id.eq(line_id))
            .filter(voucher_line::Column::VoucherId.eq(voucher_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Voucher {} has no line {}",
                voucher_id, line_id
            )));
        }
        info!(voucher_id, line_id, "Removed voucher line");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, id: i32) -> Result<VoucherBalance, ServiceError> {
        find_voucher(&*self.db, id).await?;
        Ok(pricing::voucher_balance(&*self.db, id).await?)
    }
}

async fn find_voucher<C>(db: &C, id: i32) -> Result<voucher::Model, ServiceError>
where
    C: ConnectionTrait,
{
    voucher::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Voucher", id))
}

async fn linked_order_ids<C>(db: &C, voucher_id: i32) -> Result<Vec<i32>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(voucher_order::Entity::find()
        .select_only()
        .column(voucher_order::Column::OrderId)
        .filter(voucher_order::Column::VoucherId.eq(voucher_id))
        .order_by_asc(voucher_order::Column::OrderId)
        .into_tuple()
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateVoucherInput {
    pub payment_method: PaymentMethod,
    /// Orders covered from the start; duplicates are ignored
    #[serde(default)]
    pub order_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateVoucherInput {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct VoucherLineInput {
    #[validate(custom = "validate_payment_amount")]
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub payment_date: NaiveDate,
    #[validate(length(max = 100))]
    pub payment_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherLineView {
    pub id: i32,
    pub voucher_id: i32,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub payment_date: NaiveDate,
    pub payment_ref: Option<String>,
}

impl From<voucher_line::Model> for VoucherLineView {
    fn from(model: voucher_line::Model) -> Self {
        Self {
            id: model.id,
            voucher_id: model.voucher_id,
            amount: pricing::money(model.amount),
            payment_date: model.payment_date,
            payment_ref: model.payment_ref,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherOrderView {
    pub order_id: i32,
    #[schema(example = "ODR_000042")]
    pub reference: String,
    pub customer_name: Option<String>,
    #[schema(value_type = String, example = "300.00")]
    pub total_price: Decimal,
}

/// Voucher list row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherSummary {
    pub id: i32,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub order_ids: Vec<i32>,
    #[serde(flatten)]
    pub balance: VoucherBalance,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherDetail {
    pub id: i32,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub orders: Vec<VoucherOrderView>,
    pub lines: Vec<VoucherLineView>,
    #[serde(flatten)]
    pub balance: VoucherBalance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(amount: Decimal) -> VoucherLineInput {
        VoucherLineInput {
            amount,
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            payment_ref: None,
        }
    }

    #[test]
    fn line_amount_must_be_positive() {
        assert!(line(dec!(0)).validate().is_err());
        assert!(line(dec!(-5.00)).validate().is_err());
        assert!(line(dec!(150.00)).validate().is_ok());
    }

    #[test]
    fn payment_ref_is_bounded() {
        let mut input = line(dec!(10.00));
        input.payment_ref = Some("r".repeat(101));
        let errors = FieldErrors::from(input.validate().unwrap_err());
        assert!(errors.contains("payment_ref"));
    }

    #[test]
    fn create_voucher_accepts_missing_order_list() {
        let input: CreateVoucherInput =
            serde_json::from_str(r#"{"payment_method":"CARD"}"#).unwrap();
        assert_eq!(input.payment_method, PaymentMethod::Card);
        assert!(input.order_ids.is_empty());
    }
}
