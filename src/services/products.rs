use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{frame, glass_type, lens, product};
use crate::errors::ServiceError;
use crate::services::orders::ensure_order_exists;
use crate::services::pricing;
use crate::validation::{validate_price, FieldErrors};

/// Product service: the frame/glass/lens combinations sold on an order.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        order_id: i32,
        input: ProductInput,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;
        missing_references(
            &*self.db,
            Some(input.frame_id),
            Some(input.glass_type_id),
            Some(input.lens_id),
        )
        .await?
        .into_result()?;

        let created = product::ActiveModel {
            order_id: Set(order_id),
            frame_id: Set(input.frame_id),
            glass_type_id: Set(input.glass_type_id),
            lens_id: Set(input.lens_id),
            price: Set(input.price),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(order_id, product_id = created.id, price = %created.price, "Created product");
        self.describe_one(created).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductView, ServiceError> {
        let model = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        self.describe_one(model).await
    }

    /// Products of one order, or of every order when `order_id` is absent.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        order_id: Option<i32>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<ProductView>, u64), ServiceError> {
        let mut query = product::Entity::find();
        if let Some(order_id) = order_id {
            query = query.filter(product::Column::OrderId.eq(order_id));
        }

        let total = query.clone().count(&*self.db).await?;
        let models = query
            .order_by_asc(product::Column::OrderId)
            .order_by_asc(product::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok((describe_products(&*self.db, models).await?, total))
    }

    /// All products of an order; the order must exist.
    #[instrument(skip(self))]
    pub async fn products_for_order(&self, order_id: i32) -> Result<Vec<ProductView>, ServiceError> {
        ensure_order_exists(&*self.db, order_id).await?;
        let models = product::Entity::find()
            .filter(product::Column::OrderId.eq(order_id))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(describe_products(&*self.db, models).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;
        let model = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        missing_references(&*self.db, input.frame_id, input.glass_type_id, input.lens_id)
            .await?
            .into_result()?;

        let mut active: product::ActiveModel = model.into();
        if let Some(frame_id) = input.frame_id {
            active.frame_id = Set(frame_id);
        }
        if let Some(glass_type_id) = input.glass_type_id {
            active.glass_type_id = Set(glass_type_id);
        }
        if let Some(lens_id) = input.lens_id {
            active.lens_id = Set(lens_id);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        let updated = active.update(&*self.db).await?;

        info!(product_id = id, "Updated product");
        self.describe_one(updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product", id));
        }
        info!(product_id = id, "Deleted product");
        Ok(())
    }

    async fn describe_one(&self, model: product::Model) -> Result<ProductView, ServiceError> {
        let id = model.id;
        describe_products(&*self.db, vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }
}

/// Field errors for catalog ids that do not resolve to a row.
pub async fn missing_references<C>(
    db: &C,
    frame_id: Option<i32>,
    glass_type_id: Option<i32>,
    lens_id: Option<i32>,
) -> Result<FieldErrors, DbErr>
where
    C: ConnectionTrait,
{
    let mut errors = FieldErrors::new();
    if let Some(id) = frame_id {
        if frame::Entity::find_by_id(id).count(db).await? == 0 {
            errors.add("frame_id", format!("Frame {} does not exist", id));
        }
    }
    if let Some(id) = glass_type_id {
        if glass_type::Entity::find_by_id(id).count(db).await? == 0 {
            errors.add("glass_type_id", format!("Glass type {} does not exist", id));
        }
    }
    if let Some(id) = lens_id {
        if lens::Entity::find_by_id(id).count(db).await? == 0 {
            errors.add("lens_id", format!("Lens {} does not exist", id));
        }
    }
    Ok(errors)
}

/// Attaches catalog labels to products, loading each catalog table once.
pub async fn describe_products<C>(
    db: &C,
    models: Vec<product::Model>,
) -> Result<Vec<ProductView>, DbErr>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let frame_ids: Vec<i32> = models.iter().map(|p| p.frame_id).collect();
    let glass_type_ids: Vec<i32> = models.iter().map(|p| p.glass_type_id).collect();
    let lens_ids: Vec<i32> = models.iter().map(|p| p.lens_id).collect();

    let frames: HashMap<i32, String> = frame::Entity::find()
        .filter(frame::Column::Id.is_in(frame_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f.title))
        .collect();
    let glass_types: HashMap<i32, String> = glass_type::Entity::find()
        .filter(glass_type::Column::Id.is_in(glass_type_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g.label()))
        .collect();
    let lenses: HashMap<i32, String> = lens::Entity::find()
        .filter(lens::Column::Id.is_in(lens_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|l| (l.id, l.title))
        .collect();

    Ok(models
        .into_iter()
        .map(|p| {
            let frame = frames.get(&p.frame_id).cloned().unwrap_or_default();
            let glass_type = glass_types.get(&p.glass_type_id).cloned().unwrap_or_default();
            let lens = lenses.get(&p.lens_id).cloned().unwrap_or_default();
            ProductView {
                label: product::label(&frame, &glass_type, &lens),
                id: p.id,
                order_id: p.order_id,
                frame_id: p.frame_id,
                frame,
                glass_type_id: p.glass_type_id,
                glass_type,
                lens_id: p.lens_id,
                lens,
                price: pricing::money(p.price),
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProductInput {
    pub frame_id: i32,
    pub glass_type_id: i32,
    pub lens_id: i32,
    /// Non-negative, at most two decimal places
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "149.99")]
    pub price: Decimal,
}

/// Partial update; omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    pub frame_id: Option<i32>,
    pub glass_type_id: Option<i32>,
    pub lens_id: Option<i32>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = Option<String>, example = "149.99")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: i32,
    pub order_id: i32,
    pub frame_id: i32,
    pub frame: String,
    pub glass_type_id: i32,
    #[schema(example = "Far, Polarized")]
    pub glass_type: String,
    pub lens_id: i32,
    pub lens: String,
    #[schema(example = "Aviator - Far, Polarized - Zeiss 1.6")]
    pub label: String,
    #[schema(value_type = String, example = "149.99")]
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_price_is_rejected() {
        let input = ProductInput {
            frame_id: 1,
            glass_type_id: 1,
            lens_id: 1,
            price: dec!(-0.01),
        };
        let errors = FieldErrors::from(input.validate().unwrap_err());
        assert!(errors.contains("price"));
    }

    #[test]
    fn price_precision_is_enforced_on_update() {
        let input = UpdateProductInput {
            price: Some(dec!(10.001)),
            ..Default::default()
        };
        assert!(input.validate().is_err());
        assert!(UpdateProductInput::default().validate().is_ok());
    }
}
