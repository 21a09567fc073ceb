use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

/// A customer purchase. Everything else in the shop hangs off an order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Shop reference printed on paperwork, e.g. `ODR_000042`.
    pub fn reference(&self) -> String {
        reference(self.id)
    }
}

pub fn reference(id: i32) -> String {
    format!("ODR_{:06}", id)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_one = "super::identity::Entity")]
    Identity,
    #[sea_orm(has_one = "super::contact::Entity")]
    Contact,
    #[sea_orm(has_one = "super::institution::Entity")]
    Institution,
    #[sea_orm(has_one = "super::prescription_detail::Entity")]
    PrescriptionDetail,
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::voucher_order::Entity")]
    VoucherOrders,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::identity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identity.def()
    }
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl Related<super::institution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Institution.def()
    }
}

impl Related<super::prescription_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrescriptionDetail.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::voucher::Entity> for Entity {
    fn to() -> RelationDef {
        super::voucher_order::Relation::Voucher.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::voucher_order::Relation::Order.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_zero_padded() {
        assert_eq!(reference(42), "ODR_000042");
        assert_eq!(reference(1), "ODR_000001");
        assert_eq!(reference(1234567), "ODR_1234567");
    }
}
