use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{
    contact, identity, institution, order, prescription_detail, product, user, voucher_order,
};
use crate::errors::ServiceError;
use crate::services::order_details::{ContactView, IdentityView, InstitutionView, PrescriptionView};
use crate::services::pricing;
use crate::services::products::{describe_products, ProductView};

const REFERENCE_PREFIX: &str = "ODR_";

/// Loads an order or fails with `NotFound`.
pub async fn ensure_order_exists<C>(db: &C, order_id: i32) -> Result<order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order", order_id))
}

/// Accepts `42`, `000042` or `ODR_000042`.
pub fn parse_order_reference(term: &str) -> Option<i32> {
    let term = term.trim();
    let digits = term
        .strip_prefix(REFERENCE_PREFIX)
        .or_else(|| term.strip_prefix(&REFERENCE_PREFIX.to_lowercase()))
        .unwrap_or(term);
    digits.parse::<i32>().ok().filter(|id| *id > 0)
}

/// Service for managing orders
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<OrderView, ServiceError> {
        let owner = user::Entity::find_by_id(input.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", input.user_id))?;

        let created = order::ActiveModel {
            user_id: Set(owner.id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(order_id = created.id, user_id = owner.id, "Created order");
        Ok(OrderView::build(created, Some(owner.username), None, Decimal::ZERO))
    }

    /// Newest first. `search` matches the order id / reference or the
    /// customer's first or last name.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<OrderView>, u64), ServiceError> {
        let mut query = order::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let mut condition = Condition::any()
                .add(identity::Column::FirstName.contains(term))
                .add(identity::Column::LastName.contains(term));
            if let Some(id) = parse_order_reference(term) {
                condition = condition.add(order::Column::Id.eq(id));
            }
            query = query
                .join(JoinType::LeftJoin, order::Relation::Identity.def())
                .filter(condition);
        }

        let total = query.clone().count(&*self.db).await?;
        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        let rows = self.build_views(orders).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db;
        let model = ensure_order_exists(db, id).await?;

        let identity = identity::Entity::find()
            .filter(identity::Column::OrderId.eq(id))
            .one(db)
            .await?;
        let contact = contact::Entity::find()
            .filter(contact::Column::OrderId.eq(id))
            .one(db)
            .await?;
        let institution = institution::Entity::find()
            .filter(institution::Column::OrderId.eq(id))
            .one(db)
            .await?;
        let prescription = prescription_detail::Entity::find()
            .filter(prescription_detail::Column::OrderId.eq(id))
            .one(db)
            .await?;
        let products = product::Entity::find()
            .filter(product::Column::OrderId.eq(id))
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;
        let voucher_ids: Vec<i32> = voucher_order::Entity::find()
            .select_only()
            .column(voucher_order::Column::VoucherId)
            .filter(voucher_order::Column::OrderId.eq(id))
            .order_by_asc(voucher_order::Column::VoucherId)
            .into_tuple()
            .all(db)
            .await?;
        let username = user::Entity::find_by_id(model.user_id)
            .one(db)
            .await?
            .map(|u| u.username);

        let total_price = pricing::total_price(products.iter().map(|p| &p.price));
        let customer_name = identity.as_ref().map(identity::Model::full_name);
        let products = describe_products(db, products).await?;

        Ok(OrderDetail {
            order: OrderView::build(model, username, customer_name, total_price),
            identity: identity.map(IdentityView::from),
            contact: contact.map(ContactView::from),
            institution: institution.map(InstitutionView::from),
            prescription: prescription.map(PrescriptionView::from),
            products,
            voucher_ids,
        })
    }

    /// Most recently created order.
    #[instrument(skip(self))]
    pub async fn latest_order(&self) -> Result<OrderView, ServiceError> {
        let latest = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No orders recorded yet".to_string()))?;

        let mut rows = self.build_views(vec![latest]).await?;
        rows.pop()
            .ok_or_else(|| ServiceError::InternalError("latest order vanished".to_string()))
    }

    /// Order together with its identity; both must exist.
    #[instrument(skip(self))]
    pub async fn order_summary(&self, id: i32) -> Result<OrderSummary, ServiceError> {
        let model = ensure_order_exists(&*self.db, id).await?;
        let identity = identity::Entity::find()
            .filter(identity::Column::OrderId.eq(id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no identity", id)))?;
        let total_price = pricing::order_total_price(&*self.db, id).await?;

        Ok(OrderSummary {
            id: model.id,
            reference: model.reference(),
            created_at: model.created_at,
            identity: identity.into(),
            total_price,
        })
    }

    #[instrument(skip(self))]
    pub async fn total_price(&self, id: i32) -> Result<Decimal, ServiceError> {
        ensure_order_exists(&*self.db, id).await?;
        Ok(pricing::order_total_price(&*self.db, id).await?)
    }

    /// Reassigns an order to another user.
    #[instrument(skip(self))]
    pub async fn change_owner(
        &self,
        id: i32,
        input: ChangeOwnerInput,
    ) -> Result<OrderView, ServiceError> {
        let model = ensure_order_exists(&*self.db, id).await?;
        let owner = user::Entity::find_by_id(input.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", input.user_id))?;

        let previous = model.user_id;
        let mut active: order::ActiveModel = model.into();
        active.user_id = Set(owner.id);
        let updated = active.update(&*self.db).await?;

        info!(order_id = id, from = previous, to = owner.id, "Changed order owner");
        let mut rows = self.build_views(vec![updated]).await?;
        rows.pop()
            .ok_or_else(|| ServiceError::InternalError("updated order vanished".to_string()))
    }

    /// Deletes an order; details, products and voucher links go with it.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<(), ServiceError> {
        let result = order::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            warn!(order_id = id, "Delete requested for missing order");
            return Err(ServiceError::not_found("Order", id));
        }
        info!(order_id = id, "Deleted order");
        Ok(())
    }

    async fn build_views(&self, orders: Vec<order::Model>) -> Result<Vec<OrderView>, ServiceError> {
        let db = &*self.db;
        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut user_ids: Vec<i32> = orders.iter().map(|o| o.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let totals = pricing::order_totals(db, &order_ids).await?;
        let usernames: HashMap<i32, String> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };
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

        Ok(orders
            .into_iter()
            .map(|o| {
                let total = totals.get(&o.id).copied().unwrap_or(Decimal::ZERO);
                let username = usernames.get(&o.user_id).cloned();
                let name = names.get(&o.id).cloned();
                OrderView::build(o, username, name, total)
            })
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    /// Owning user
    pub user_id: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ChangeOwnerInput {
    pub user_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub user_id: Option<i32>,
    pub search: Option<String>,
}

/// Order list row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: i32,
    #[schema(example = "ODR_000042")]
    pub reference: String,
    pub user_id: i32,
    pub username: Option<String>,
    /// Identity full name, when recorded
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[schema(value_type = String, example = "300.00")]
    pub total_price: Decimal,
}

impl OrderView {
    fn build(
        model: order::Model,
        username: Option<String>,
        customer_name: Option<String>,
        total_price: Decimal,
    ) -> Self {
        Self {
            reference: model.reference(),
            id: model.id,
            user_id: model.user_id,
            username,
            customer_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            total_price: pricing::money(total_price),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderView,
    pub identity: Option<IdentityView>,
    pub contact: Option<ContactView>,
    pub institution: Option<InstitutionView>,
    pub prescription: Option<PrescriptionView>,
    pub products: Vec<ProductView>,
    pub voucher_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub identity: IdentityView,
    #[schema(value_type = String, example = "300.00")]
    pub total_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_parse_with_or_without_prefix() {
        assert_eq!(parse_order_reference("42"), Some(42));
        assert_eq!(parse_order_reference("ODR_000042"), Some(42));
        assert_eq!(parse_order_reference("odr_7"), Some(7));
        assert_eq!(parse_order_reference(" 000003 "), Some(3));
    }

    #[test]
    fn names_are_not_references() {
        assert_eq!(parse_order_reference("Popescu"), None);
        assert_eq!(parse_order_reference("ODR_"), None);
        assert_eq!(parse_order_reference("0"), None);
    }
}
