use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{
    validate_axis, validate_lens_power, validate_pupillary_distance, FieldErrors,
};

/// Optical measurements for one order.
///
/// Far, near and intermediate vision are each measured for the right (`od`)
/// and left (`os`) eye. Every measurement is optional; a populated value must
/// fall within the ranges enforced by [`crate::validation`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prescription_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_id: i32,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub far_od_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub far_od_cylindric: Option<Decimal>,
    pub far_od_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub far_os_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub far_os_cylindric: Option<Decimal>,
    pub far_os_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))", nullable)]
    pub far_pupillary_distance: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub near_od_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub near_od_cylindric: Option<Decimal>,
    pub near_od_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub near_os_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub near_os_cylindric: Option<Decimal>,
    pub near_os_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))", nullable)]
    pub near_pupillary_distance: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub intermediate_od_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub intermediate_od_cylindric: Option<Decimal>,
    pub intermediate_od_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub intermediate_os_spheric: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub intermediate_os_cylindric: Option<Decimal>,
    pub intermediate_os_axis: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((5, 1)))", nullable)]
    pub intermediate_pupillary_distance: Option<Decimal>,
}

impl Model {
    pub fn label(&self) -> String {
        label(self.order_id)
    }
}

pub fn label(order_id: i32) -> String {
    format!("Prescription for Order {}", order_id)
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

impl ActiveModel {
    /// Range checks over every assigned measurement, keyed by nested path
    /// (`far.od.axis`).
    pub fn field_errors(&self) -> FieldErrors {
        let mut e = FieldErrors::new();

        e.check_active_opt("far.od.spheric", &self.far_od_spheric, validate_lens_power);
        e.check_active_opt("far.od.cylindric", &self.far_od_cylindric, validate_lens_power);
        e.check_active_opt("far.od.axis", &self.far_od_axis, |v| validate_axis(*v));
        e.check_active_opt("far.os.spheric", &self.far_os_spheric, validate_lens_power);
        e.check_active_opt("far.os.cylindric", &self.far_os_cylindric, validate_lens_power);
        e.check_active_opt("far.os.axis", &self.far_os_axis, |v| validate_axis(*v));
        e.check_active_opt(
            "far.pupillary_distance",
            &self.far_pupillary_distance,
            validate_pupillary_distance,
        );

        e.check_active_opt("near.od.spheric", &self.near_od_spheric, validate_lens_power);
        e.check_active_opt("near.od.cylindric", &self.near_od_cylindric, validate_lens_power);
        e.check_active_opt("near.od.axis", &self.near_od_axis, |v| validate_axis(*v));
        e.check_active_opt("near.os.spheric", &self.near_os_spheric, validate_lens_power);
        e.check_active_opt("near.os.cylindric", &self.near_os_cylindric, validate_lens_power);
        e.check_active_opt("near.os.axis", &self.near_os_axis, |v| validate_axis(*v));
        e.check_active_opt(
            "near.pupillary_distance",
            &self.near_pupillary_distance,
            validate_pupillary_distance,
        );

        e.check_active_opt(
            "intermediate.od.spheric",
            &self.intermediate_od_spheric,
            validate_lens_power,
        );
        e.check_active_opt(
            "intermediate.od.cylindric",
            &self.intermediate_od_cylindric,
            validate_lens_power,
        );
        e.check_active_opt("intermediate.od.axis", &self.intermediate_od_axis, |v| {
            validate_axis(*v)
        });
        e.check_active_opt(
            "intermediate.os.spheric",
            &self.intermediate_os_spheric,
            validate_lens_power,
        );
        e.check_active_opt(
            "intermediate.os.cylindric",
            &self.intermediate_os_cylindric,
            validate_lens_power,
        );
        e.check_active_opt("intermediate.os.axis", &self.intermediate_os_axis, |v| {
            validate_axis(*v)
        });
        e.check_active_opt(
            "intermediate.pupillary_distance",
            &self.intermediate_pupillary_distance,
            validate_pupillary_distance,
        );

        e
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.field_errors().into_db_result()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue::{NotSet, Set};

    #[test]
    fn label_names_the_order() {
        assert_eq!(label(7), "Prescription for Order 7");
    }

    #[test]
    fn unset_and_null_measurements_pass() {
        let model = ActiveModel {
            order_id: Set(1),
            far_od_axis: Set(None),
            ..Default::default()
        };
        assert!(model.field_errors().is_empty());
    }

    #[test]
    fn out_of_range_measurements_are_reported_by_path() {
        let model = ActiveModel {
            id: NotSet,
            order_id: Set(1),
            far_od_axis: Set(Some(200)),
            near_os_spheric: Set(Some(dec!(25.00))),
            intermediate_pupillary_distance: Set(Some(dec!(45.0))),
            far_pupillary_distance: Set(Some(dec!(62.5))),
            ..Default::default()
        };
        let errors = model.field_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains("far.od.axis"));
        assert!(errors.contains("near.os.spheric"));
        assert!(errors.contains("intermediate.pupillary_distance"));
    }

    #[test]
    fn pupillary_distance_columns_keep_five_digits_one_decimal() {
        for column in [
            Column::FarPupillaryDistance,
            Column::NearPupillaryDistance,
            Column::IntermediatePupillaryDistance,
        ] {
            assert_eq!(
                column.def().get_column_type(),
                &ColumnType::Decimal(Some((5, 1))),
                "{column:?}"
            );
        }
    }
}
