use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "glass_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub distance: Distance,
    pub treatment: Option<Treatment>,
}

impl Model {
    pub fn label(&self) -> String {
        label(self.distance, self.treatment)
    }
}

/// `Far`, or `Near, Polarized` when a treatment is applied.
pub fn label(distance: Distance, treatment: Option<Treatment>) -> String {
    match treatment {
        Some(treatment) => format!("{}, {}", distance.label(), treatment.label()),
        None => distance.label().to_string(),
    }
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

impl ActiveModelBehavior for ActiveModel {}

/// Viewing distance the glass is cut for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Distance {
    #[sea_orm(string_value = "FAR")]
    Far,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[default]
    #[sea_orm(string_value = "NEAR")]
    Near,
}

impl Distance {
    pub fn label(&self) -> &'static str {
        match self {
            Distance::Far => "Far",
            Distance::Medium => "Medium",
            Distance::Near => "Near",
        }
    }
}

/// Optional surface treatment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Treatment {
    #[sea_orm(string_value = "POLARIZED")]
    Polarized,
    #[sea_orm(string_value = "UV_PROTECTION")]
    UvProtection,
    #[sea_orm(string_value = "ANTI_REFLECTIVE")]
    AntiReflective,
}

impl Treatment {
    pub fn label(&self) -> &'static str {
        match self {
            Treatment::Polarized => "Polarized",
            Treatment::UvProtection => "UV Protection",
            Treatment::AntiReflective => "Anti-Reflective",
        }
    }
}
