use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{validate_not_blank, FieldErrors};

pub const NAME_MAX_LEN: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "identities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
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
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

fn check_name(value: &String) -> Result<(), validator::ValidationError> {
    validate_not_blank(value)?;
    if value.chars().count() > NAME_MAX_LEN {
        return Err(validator::ValidationError::new("length"));
    }
    Ok(())
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut errors = FieldErrors::new();
        errors.check_active("first_name", &self.first_name, check_name);
        errors.check_active("last_name", &self.last_name, check_name);
        errors.into_db_result()?;
        Ok(self)
    }
}
