use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{validate_not_blank, FieldErrors};

pub const TITLE_MAX_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "frames")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut errors = FieldErrors::new();
        errors.check_active("title", &self.title, |v| {
            validate_not_blank(v)?;
            if v.chars().count() > TITLE_MAX_LEN {
                return Err(validator::ValidationError::new("length"));
            }
            Ok(())
        });
        errors.into_db_result()?;
        Ok(self)
    }
}
