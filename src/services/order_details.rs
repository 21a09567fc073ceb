use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{contact, identity, institution, prescription_detail};
use crate::errors::ServiceError;
use crate::services::orders::ensure_order_exists;
use crate::validation::{
    validate_axis, validate_lens_power, validate_not_blank, validate_phone_number,
    validate_pupillary_distance,
};

/// The one-to-one records hanging off an order: identity, contact,
/// institution and prescription.
#[derive(Clone)]
pub struct OrderDetailsService {
    db: Arc<DatabaseConnection>,
}

impl OrderDetailsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ---- identity ----

    #[instrument(skip(self))]
    pub async fn get_identity(&self, order_id: i32) -> Result<IdentityView, ServiceError> {
        identity::Entity::find()
            .filter(identity::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .map(IdentityView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no identity", order_id)))
    }

    /// Creates the identity of an order that has none yet.
    #[instrument(skip(self))]
    pub async fn create_identity(
        &self,
        order_id: i32,
        input: IdentityInput,
    ) -> Result<IdentityView, ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;

        let existing = identity::Entity::find()
            .filter(identity::Column::OrderId.eq(order_id))
            .count(&*self.db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Order {} already has an identity",
                order_id
            )));
        }

        let created = input.into_active_model(order_id).insert(&*self.db).await?;
        info!(order_id, identity_id = created.id, "Created identity");
        Ok(created.into())
    }

    /// Inline edit: replaces the identity of an order, creating it if absent.
    /// The flag is `true` when a new record was inserted.
    #[instrument(skip(self))]
    pub async fn upsert_identity(
        &self,
        order_id: i32,
        input: IdentityInput,
    ) -> Result<(IdentityView, bool), ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;

        let existing = identity::Entity::find()
            .filter(identity::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;
        let (model, created) = match existing {
            Some(model) => {
                let mut active: identity::ActiveModel = model.into();
                input.apply(&mut active);
                (active.update(&*self.db).await?, false)
            }
            None => (
                input.into_active_model(order_id).insert(&*self.db).await?,
                true,
            ),
        };

        info!(order_id, created, "Saved identity");
        Ok((model.into(), created))
    }

    #[instrument(skip(self))]
    pub async fn delete_identity(&self, order_id: i32) -> Result<(), ServiceError> {
        let model = identity::Entity::find()
            .filter(identity::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no identity", order_id)))?;
        model.delete(&*self.db).await?;
        info!(order_id, "Deleted identity");
        Ok(())
    }

    /// Identities by first or last name, or by order id when the search term is numeric.
    #[instrument(skip(self))]
    pub async fn list_identities(
        &self,
        search: Option<String>,
        order_id: Option<i32>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<IdentityView>, u64), ServiceError> {
        let mut query = identity::Entity::find();
        if let Some(order_id) = order_id {
            query = query.filter(identity::Column::OrderId.eq(order_id));
        }
        if let Some(term) = search_term(&search) {
            let mut condition = Condition::any()
                .add(identity::Column::FirstName.contains(term))
                .add(identity::Column::LastName.contains(term));
            if let Ok(id) = term.parse::<i32>() {
                condition = condition.add(identity::Column::OrderId.eq(id));
            }
            query = query.filter(condition);
        }

        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(identity::Column::LastName)
            .order_by_asc(identity::Column::FirstName)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(IdentityView::from).collect(), total))
    }

    // ---- contact ----

    #[instrument(skip(self))]
    pub async fn get_contact(&self, order_id: i32) -> Result<ContactView, ServiceError> {
        contact::Entity::find()
            .filter(contact::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .map(ContactView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no contact", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn upsert_contact(
        &self,
        order_id: i32,
        input: ContactInput,
    ) -> Result<(ContactView, bool), ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;

        let existing = contact::Entity::find()
            .filter(contact::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;
        let (model, created) = match existing {
            Some(model) => {
                let mut active: contact::ActiveModel = model.into();
                input.apply(&mut active);
                (active.update(&*self.db).await?, false)
            }
            None => (
                input.into_active_model(order_id).insert(&*self.db).await?,
                true,
            ),
        };

        info!(order_id, created, "Saved contact");
        Ok((model.into(), created))
    }

    #[instrument(skip(self))]
    pub async fn delete_contact(&self, order_id: i32) -> Result<(), ServiceError> {
        let model = contact::Entity::find()
            .filter(contact::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no contact", order_id)))?;
        model.delete(&*self.db).await?;
        info!(order_id, "Deleted contact");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_contacts(
        &self,
        search: Option<String>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<ContactView>, u64), ServiceError> {
        let mut query = contact::Entity::find();
        if let Some(term) = search_term(&search) {
            query = query.filter(contact::Column::PhoneNumber.contains(term));
        }

        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(contact::Column::OrderId)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(ContactView::from).collect(), total))
    }

    // ---- institution ----

    #[instrument(skip(self))]
    pub async fn get_institution(&self, order_id: i32) -> Result<InstitutionView, ServiceError> {
        institution::Entity::find()
            .filter(institution::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .map(InstitutionView::from)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} has no institution", order_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn upsert_institution(
        &self,
        order_id: i32,
        input: InstitutionInput,
    ) -> Result<(InstitutionView, bool), ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;

        let existing = institution::Entity::find()
            .filter(institution::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;
        let (model, created) = match existing {
            Some(model) => {
                let mut active: institution::ActiveModel = model.into();
                input.apply(&mut active);
                (active.update(&*self.db).await?, false)
            }
            None => (
                input.into_active_model(order_id).insert(&*self.db).await?,
                true,
            ),
        };

        info!(order_id, created, "Saved institution");
        Ok((model.into(), created))
    }

    #[instrument(skip(self))]
    pub async fn delete_institution(&self, order_id: i32) -> Result<(), ServiceError> {
        let model = institution::Entity::find()
            .filter(institution::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} has no institution", order_id))
            })?;
        model.delete(&*self.db).await?;
        info!(order_id, "Deleted institution");
        Ok(())
    }

    /// Institutions by title or address.
    #[instrument(skip(self))]
    pub async fn list_institutions(
        &self,
        search: Option<String>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<InstitutionView>, u64), ServiceError> {
        let mut query = institution::Entity::find();
        if let Some(term) = search_term(&search) {
            query = query.filter(
                Condition::any()
                    .add(institution::Column::Title.contains(term))
                    .add(institution::Column::Address.contains(term)),
            );
        }

        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(institution::Column::Title)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(InstitutionView::from).collect(), total))
    }

    // ---- prescription ----

    #[instrument(skip(self))]
    pub async fn get_prescription(&self, order_id: i32) -> Result<PrescriptionView, ServiceError> {
        prescription_detail::Entity::find()
            .filter(prescription_detail::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .map(PrescriptionView::from)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} has no prescription", order_id))
            })
    }

    /// Replaces every measurement of the order's prescription.
    #[instrument(skip(self))]
    pub async fn upsert_prescription(
        &self,
        order_id: i32,
        input: PrescriptionInput,
    ) -> Result<(PrescriptionView, bool), ServiceError> {
        input.validate()?;
        ensure_order_exists(&*self.db, order_id).await?;

        let existing = prescription_detail::Entity::find()
            .filter(prescription_detail::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;
        let (model, created) = match existing {
            Some(model) => {
                let mut active: prescription_detail::ActiveModel = model.into();
                input.apply(&mut active);
                (active.update(&*self.db).await?, false)
            }
            None => (
                input.into_active_model(order_id).insert(&*self.db).await?,
                true,
            ),
        };

        info!(order_id, created, "Saved prescription");
        Ok((model.into(), created))
    }

    #[instrument(skip(self))]
    pub async fn delete_prescription(&self, order_id: i32) -> Result<(), ServiceError> {
        let model = prescription_detail::Entity::find()
            .filter(prescription_detail::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} has no prescription", order_id))
            })?;
        model.delete(&*self.db).await?;
        info!(order_id, "Deleted prescription");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_prescriptions(
        &self,
        order_id: Option<i32>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<PrescriptionView>, u64), ServiceError> {
        let mut query = prescription_detail::Entity::find();
        if let Some(order_id) = order_id {
            query = query.filter(prescription_detail::Column::OrderId.eq(order_id));
        }

        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_desc(prescription_detail::Column::OrderId)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(PrescriptionView::from).collect(), total))
    }
}

fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---- payloads ----

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct IdentityInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    #[schema(example = "Ana")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    #[schema(example = "Popescu")]
    pub last_name: String,
}

impl IdentityInput {
    pub fn apply(&self, active: &mut identity::ActiveModel) {
        active.first_name = Set(self.first_name.trim().to_string());
        active.last_name = Set(self.last_name.trim().to_string());
    }

    pub fn into_active_model(self, order_id: i32) -> identity::ActiveModel {
        let mut active = identity::ActiveModel {
            order_id: Set(order_id),
            ..Default::default()
        };
        self.apply(&mut active);
        active
    }
}

/// Public identity form: the order is chosen in the payload.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct NewIdentityInput {
    pub order_id: i32,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub last_name: String,
}

impl NewIdentityInput {
    pub fn split(self) -> (i32, IdentityInput) {
        (
            self.order_id,
            IdentityInput {
                first_name: self.first_name,
                last_name: self.last_name,
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct ContactInput {
    /// Empty, or `+999999999` with 9 to 15 digits
    #[serde(default)]
    #[validate(custom = "validate_phone_number")]
    #[schema(example = "+40712345678")]
    pub phone_number: String,
}

impl ContactInput {
    pub fn apply(&self, active: &mut contact::ActiveModel) {
        active.phone_number = Set(self.phone_number.trim().to_string());
    }

    pub fn into_active_model(self, order_id: i32) -> contact::ActiveModel {
        let mut active = contact::ActiveModel {
            order_id: Set(order_id),
            ..Default::default()
        };
        self.apply(&mut active);
        active
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct InstitutionInput {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    #[schema(example = "City Hospital")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "12 Main Street")]
    pub address: String,
}

impl InstitutionInput {
    pub fn apply(&self, active: &mut institution::ActiveModel) {
        active.title = Set(self.title.trim().to_string());
        active.address = Set(self.address.clone());
    }

    pub fn into_active_model(self, order_id: i32) -> institution::ActiveModel {
        let mut active = institution::ActiveModel {
            order_id: Set(order_id),
            ..Default::default()
        };
        self.apply(&mut active);
        active
    }
}

/// Measurements for one eye. `od` is the right eye, `os` the left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct EyeMeasurements {
    #[validate(custom = "validate_lens_power")]
    #[schema(value_type = Option<String>, example = "-1.25")]
    pub spheric: Option<Decimal>,
    #[validate(custom = "validate_lens_power")]
    #[schema(value_type = Option<String>, example = "0.50")]
    pub cylindric: Option<Decimal>,
    #[validate(custom = "validate_axis")]
    #[schema(example = 90)]
    pub axis: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct VisionMeasurements {
    #[validate]
    pub od: EyeMeasurements,
    #[validate]
    pub os: EyeMeasurements,
    #[validate(custom = "validate_pupillary_distance")]
    #[schema(value_type = Option<String>, example = "62.5")]
    pub pupillary_distance: Option<Decimal>,
}

/// Full prescription. Omitted measurements are stored as null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct PrescriptionInput {
    #[validate]
    pub far: VisionMeasurements,
    #[validate]
    pub near: VisionMeasurements,
    #[validate]
    pub intermediate: VisionMeasurements,
}

impl PrescriptionInput {
    pub fn apply(&self, active: &mut prescription_detail::ActiveModel) {
        let far = &self.far;
        active.far_od_spheric = Set(far.od.spheric);
        active.far_od_cylindric = Set(far.od.cylindric);
        active.far_od_axis = Set(far.od.axis);
        active.far_os_spheric = Set(far.os.spheric);
        active.far_os_cylindric = Set(far.os.cylindric);
        active.far_os_axis = Set(far.os.axis);
        active.far_pupillary_distance = Set(far.pupillary_distance);

        let near = &self.near;
        active.near_od_spheric = Set(near.od.spheric);
        active.near_od_cylindric = Set(near.od.cylindric);
        active.near_od_axis = Set(near.od.axis);
        active.near_os_spheric = Set(near.os.spheric);
        active.near_os_cylindric = Set(near.os.cylindric);
        active.near_os_axis = Set(near.os.axis);
        active.near_pupillary_distance = Set(near.pupillary_distance);

        let mid = &self.intermediate;
        active.intermediate_od_spheric = Set(mid.od.spheric);
        active.intermediate_od_cylindric = Set(mid.od.cylindric);
        active.intermediate_od_axis = Set(mid.od.axis);
        active.intermediate_os_spheric = Set(mid.os.spheric);
        active.intermediate_os_cylindric = Set(mid.os.cylindric);
        active.intermediate_os_axis = Set(mid.os.axis);
        active.intermediate_pupillary_distance = Set(mid.pupillary_distance);
    }

    pub fn into_active_model(self, order_id: i32) -> prescription_detail::ActiveModel {
        let mut active = prescription_detail::ActiveModel {
            order_id: Set(order_id),
            ..Default::default()
        };
        self.apply(&mut active);
        active
    }
}

impl From<&prescription_detail::Model> for PrescriptionInput {
    fn from(m: &prescription_detail::Model) -> Self {
        Self {
            far: VisionMeasurements {
                od: EyeMeasurements {
                    spheric: m.far_od_spheric,
                    cylindric: m.far_od_cylindric,
                    axis: m.far_od_axis,
                },
                os: EyeMeasurements {
                    spheric: m.far_os_spheric,
                    cylindric: m.far_os_cylindric,
                    axis: m.far_os_axis,
                },
                pupillary_distance: m.far_pupillary_distance,
            },
            near: VisionMeasurements {
                od: EyeMeasurements {
                    spheric: m.near_od_spheric,
                    cylindric: m.near_od_cylindric,
                    axis: m.near_od_axis,
                },
                os: EyeMeasurements {
                    spheric: m.near_os_spheric,
                    cylindric: m.near_os_cylindric,
                    axis: m.near_os_axis,
                },
                pupillary_distance: m.near_pupillary_distance,
            },
            intermediate: VisionMeasurements {
                od: EyeMeasurements {
                    spheric: m.intermediate_od_spheric,
                    cylindric: m.intermediate_od_cylindric,
                    axis: m.intermediate_od_axis,
                },
                os: EyeMeasurements {
                    spheric: m.intermediate_os_spheric,
                    cylindric: m.intermediate_os_cylindric,
                    axis: m.intermediate_os_axis,
                },
                pupillary_distance: m.intermediate_pupillary_distance,
            },
        }
    }
}

// ---- views ----

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityView {
    pub id: i32,
    pub order_id: i32,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "Ana Popescu")]
    pub full_name: String,
}

impl From<identity::Model> for IdentityView {
    fn from(model: identity::Model) -> Self {
        Self {
            full_name: model.full_name(),
            id: model.id,
            order_id: model.order_id,
            first_name: model.first_name,
            last_name: model.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactView {
    pub id: i32,
    pub order_id: i32,
    pub phone_number: String,
}

impl From<contact::Model> for ContactView {
    fn from(model: contact::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            phone_number: model.phone_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstitutionView {
    pub id: i32,
    pub order_id: i32,
    pub title: String,
    pub address: String,
    /// First 50 characters of the address
    pub address_preview: String,
}

impl From<institution::Model> for InstitutionView {
    fn from(model: institution::Model) -> Self {
        Self {
            address_preview: model.address_preview(),
            id: model.id,
            order_id: model.order_id,
            title: model.title,
            address: model.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionView {
    pub id: i32,
    pub order_id: i32,
    #[schema(example = "Prescription for Order 42")]
    pub label: String,
    #[serde(flatten)]
    pub measurements: PrescriptionInput,
}

impl From<prescription_detail::Model> for PrescriptionView {
    fn from(model: prescription_detail::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            label: model.label(),
            measurements: PrescriptionInput::from(&model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldErrors;
    use rust_decimal_macros::dec;

    #[test]
    fn prescription_errors_carry_nested_paths() {
        let mut input = PrescriptionInput::default();
        input.far.od.axis = Some(200);
        input.near.pupillary_distance = Some(dec!(71.0));
        input.intermediate.os.spheric = Some(dec!(1.255));

        let errors = FieldErrors::from(input.validate().unwrap_err());
        assert!(errors.contains("far.od.axis"));
        assert!(errors.contains("near.pupillary_distance"));
        assert!(errors.contains("intermediate.os.spheric"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn axis_bounds_apply_to_every_eye() {
        let mut input = PrescriptionInput::default();
        input.far.od.axis = Some(0);
        input.far.os.axis = Some(180);
        input.near.od.axis = Some(90);
        assert!(input.validate().is_ok());

        input.near.os.axis = Some(-1);
        input.intermediate.od.axis = Some(181);
        let errors = FieldErrors::from(input.validate().unwrap_err());
        assert_eq!(
            errors.get("near.os.axis").unwrap()[0],
            "Ensure this value is between 0 and 180"
        );
        assert!(errors.contains("intermediate.od.axis"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn empty_prescription_is_valid() {
        assert!(PrescriptionInput::default().validate().is_ok());
    }

    #[test]
    fn prescription_round_trips_through_the_model_columns() {
        let mut input = PrescriptionInput::default();
        input.far.od.spheric = Some(dec!(-1.25));
        input.far.os.axis = Some(90);
        input.intermediate.pupillary_distance = Some(dec!(62.5));

        let active = input.into_active_model(3);
        assert_eq!(active.far_od_spheric, Set(Some(dec!(-1.25))));
        assert_eq!(active.far_os_axis, Set(Some(90)));
        assert_eq!(active.near_od_axis, Set(None));
        assert_eq!(active.intermediate_pupillary_distance, Set(Some(dec!(62.5))));
    }

    #[test]
    fn contact_rejects_malformed_phone() {
        let bad = ContactInput {
            phone_number: "12-34".into(),
        };
        assert!(bad.validate().is_err());
        assert!(ContactInput::default().validate().is_ok());
    }

    #[test]
    fn identity_names_are_bounded() {
        let input = IdentityInput {
            first_name: "a".repeat(101),
            last_name: "".into(),
        };
        let errors = FieldErrors::from(input.validate().unwrap_err());
        assert!(errors.contains("first_name"));
        assert!(errors.contains("last_name"));
    }
}
