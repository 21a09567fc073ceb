use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{validate_not_blank, FieldErrors};

pub const TITLE_MAX_LEN: usize = 255;
pub const ADDRESS_PREVIEW_LEN: usize = 50;

/// Organisation that referred the customer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institutions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
}

impl Model {
    pub fn address_preview(&self) -> String {
        address_preview(&self.address)
    }
}

/// First 50 characters of an address, with an ellipsis when cut.
pub fn address_preview(address: &str) -> String {
    if address.chars().count() > ADDRESS_PREVIEW_LEN {
        let head: String = address.chars().take(ADDRESS_PREVIEW_LEN).collect();
        format!("{head}…")
    } else {
        address.to_string()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_is_kept_whole() {
        assert_eq!(address_preview("Str. Lunga 1"), "Str. Lunga 1");
    }

    #[test]
    fn long_address_is_truncated_to_fifty_chars() {
        let address = "a".repeat(60);
        let preview = address_preview(&address);
        assert_eq!(preview.chars().count(), ADDRESS_PREVIEW_LEN + 1);
        assert!(preview.ends_with('…'));
    }
}
