use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{validate_price, FieldErrors};

/// One purchasable item of an order: a frame fitted with a lens of a glass type.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub frame_id: i32,
    pub glass_type_id: i32,
    pub lens_id: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
}

pub fn label(frame: &str, glass_type: &str, lens: &str) -> String {
    format!("{} - {} - {}", frame, glass_type, lens)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::frame::Entity",
        from = "Column::FrameId",
        to = "super::frame::Column::Id",
        on_delete = "Restrict"
    )]
    Frame,
    #[sea_orm(
        belongs_to = "super::glass_type::Entity",
        from = "Column::GlassTypeId",
        to = "super::glass_type::Column::Id",
        on_delete = "Restrict"
    )]
    GlassType,
    #[sea_orm(
        belongs_to = "super::lens::Entity",
        from = "Column::LensId",
        to = "super::lens::Column::Id",
        on_delete = "Restrict"
    )]
    Lens,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::frame::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Frame.def()
    }
}

impl Related<super::glass_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlassType.def()
    }
}

impl Related<super::lens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lens.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut errors = FieldErrors::new();
        errors.check_active("price", &self.price, validate_price);
        errors.into_db_result()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_joins_components() {
        assert_eq!(
            label("Ray-Ban RB2140", "Far, Polarized", "Essilor Varilux"),
            "Ray-Ban RB2140 - Far, Polarized - Essilor Varilux"
        );
    }
}
