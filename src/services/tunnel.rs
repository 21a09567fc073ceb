//! The "tunnel": one submission that opens an order together with every
//! record hanging off it.
//!
//! Sub-forms are validated up front, catalog and user references are checked
//! inside the transaction, and all errors are reported together keyed by
//! sub-form (`identity.first_name`, `prescription.far.od.axis`,
//! `product.frame.id`). Nothing is written unless everything is valid.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, Set,
};
use serde::{
    de::{self, DeserializeOwned, Deserializer},
    Deserialize, Serialize,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DatabaseAccess;
use crate::entities::{frame, glass_type, lens, order, product, user};
use crate::errors::ServiceError;
use crate::services::catalog::{FrameInput, GlassTypeInput, LensInput};
use crate::services::order_details::{
    ContactInput, IdentityInput, InstitutionInput, PrescriptionInput,
};
use crate::services::pricing;
use crate::tracing::with_metrics;
use crate::validation::{validate_price, FieldErrors};

#[derive(Clone)]
pub struct TunnelService {
    access: DatabaseAccess,
}

impl TunnelService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            access: DatabaseAccess::new(db),
        }
    }

    #[instrument(skip(self, submission), fields(user_id = submission.user_id))]
    pub async fn submit(&self, submission: TunnelSubmission) -> Result<TunnelReceipt, ServiceError> {
        let errors = submission.field_errors();

        let receipt = with_metrics("tunnel.submit", || {
            self.access.transaction(move |txn| {
                Box::pin(async move { persist(txn, submission, errors).await })
            })
        })
        .await?;

        info!(
            order_id = receipt.order_id,
            product_id = receipt.product_id,
            "Tunnel submission stored"
        );
        Ok(receipt)
    }
}

async fn persist(
    txn: &DatabaseTransaction,
    submission: TunnelSubmission,
    mut errors: FieldErrors,
) -> Result<TunnelReceipt, ServiceError> {
    if user::Entity::find_by_id(submission.user_id).count(txn).await? == 0 {
        errors.add(
            "user_id",
            format!("User {} does not exist", submission.user_id),
        );
    }

    let TunnelProductInput {
        frame: frame_choice,
        glass_type: glass_type_choice,
        lens: lens_choice,
        price,
    } = submission.product;

    if let CatalogChoice::Existing { id } = frame_choice {
        if frame::Entity::find_by_id(id).count(txn).await? == 0 {
            errors.add("product.frame.id", format!("Frame {} does not exist", id));
        }
    }
    if let CatalogChoice::Existing { id } = glass_type_choice {
        if glass_type::Entity::find_by_id(id).count(txn).await? == 0 {
            errors.add(
                "product.glass_type.id",
                format!("Glass type {} does not exist", id),
            );
        }
    }
    if let CatalogChoice::Existing { id } = lens_choice {
        if lens::Entity::find_by_id(id).count(txn).await? == 0 {
            errors.add("product.lens.id", format!("Lens {} does not exist", id));
        }
    }

    errors.into_result()?;

    let order = order::ActiveModel {
        user_id: Set(submission.user_id),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let identity = submission.identity.into_active_model(order.id).insert(txn).await?;
    let contact = submission.contact.into_active_model(order.id).insert(txn).await?;
    let institution = submission
        .institution
        .into_active_model(order.id)
        .insert(txn)
        .await?;
    let prescription = submission
        .prescription
        .into_active_model(order.id)
        .insert(txn)
        .await?;

    let frame_id = match frame_choice {
        CatalogChoice::Existing { id } => id,
        CatalogChoice::New(input) => input.into_active_model().insert(txn).await?.id,
    };
    let glass_type_id = match glass_type_choice {
        CatalogChoice::Existing { id } => id,
        CatalogChoice::New(input) => input.into_active_model().insert(txn).await?.id,
    };
    let lens_id = match lens_choice {
        CatalogChoice::Existing { id } => id,
        CatalogChoice::New(input) => input.into_active_model().insert(txn).await?.id,
    };

    let product = product::ActiveModel {
        order_id: Set(order.id),
        frame_id: Set(frame_id),
        glass_type_id: Set(glass_type_id),
        lens_id: Set(lens_id),
        price: Set(price),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(TunnelReceipt {
        order_id: order.id,
        reference: order.reference(),
        identity_id: identity.id,
        contact_id: contact.id,
        institution_id: institution.id,
        prescription_id: prescription.id,
        product_id: product.id,
        frame_id,
        glass_type_id,
        lens_id,
        total_price: pricing::money(product.price),
    })
}

/// A catalog row picked by id, or the attributes of a new one.
///
/// An object carrying `id` must carry nothing else, so a half-filled new
/// row is never mistaken for a reference.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogChoice<T> {
    Existing { id: i32 },
    New(T),
}

impl<'de, T> Deserialize<'de> for CatalogChoice<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        match fields.remove("id") {
            Some(id) if fields.is_empty() => {
                let id = i32::deserialize(id)
                    .map_err(|e| de::Error::custom(format!("id: {e}")))?;
                Ok(CatalogChoice::Existing { id })
            }
            Some(_) => {
                let extra: Vec<&str> = fields.keys().map(String::as_str).collect();
                Err(de::Error::custom(format!(
                    "`id` selects an existing row and cannot be combined with `{}`",
                    extra.join("`, `")
                )))
            }
            None => T::deserialize(Value::Object(fields))
                .map(CatalogChoice::New)
                .map_err(de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct TunnelProductInput {
    #[schema(value_type = Object, example = json!({"id": 1}))]
    pub frame: CatalogChoice<FrameInput>,
    #[schema(value_type = Object, example = json!({"distance": "FAR", "treatment": "POLARIZED"}))]
    pub glass_type: CatalogChoice<GlassTypeInput>,
    #[schema(value_type = Object, example = json!({"title": "Single vision 1.6 index"}))]
    pub lens: CatalogChoice<LensInput>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "300.00")]
    pub price: Decimal,
}

/// Everything needed to open an order in one go.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct TunnelSubmission {
    /// Owning user
    pub user_id: i32,
    #[validate]
    pub identity: IdentityInput,
    #[validate]
    #[serde(default)]
    pub contact: ContactInput,
    #[validate]
    pub institution: InstitutionInput,
    #[validate]
    #[serde(default)]
    pub prescription: PrescriptionInput,
    #[validate]
    pub product: TunnelProductInput,
}

impl TunnelSubmission {
    /// Every validation failure across all sub-forms, keyed by sub-form path.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if let CatalogChoice::New(input) = &self.product.frame {
            if let Err(e) = input.validate() {
                errors.merge_prefixed("product.frame", e.into());
            }
        }
        if let CatalogChoice::New(input) = &self.product.lens {
            if let Err(e) = input.validate() {
                errors.merge_prefixed("product.lens", e.into());
            }
        }

        errors
    }
}

/// Ids of everything a tunnel submission created or reused.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TunnelReceipt {
    pub order_id: i32,
    #[schema(example = "ODR_000042")]
    pub reference: String,
    pub identity_id: i32,
    pub contact_id: i32,
    pub institution_id: i32,
    pub prescription_id: i32,
    pub product_id: i32,
    pub frame_id: i32,
    pub glass_type_id: i32,
    pub lens_id: i32,
    #[schema(value_type = String, example = "300.00")]
    pub total_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::glass_type::Distance;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> TunnelSubmission {
        serde_json::from_value(value).expect("valid tunnel payload")
    }

    fn valid_payload() -> serde_json::Value {
        json!({
            "user_id": 1,
            "identity": {"first_name": "Ana", "last_name": "Popescu"},
            "contact": {"phone_number": "+40712345678"},
            "institution": {"title": "City Hospital", "address": "12 Main Street"},
            "prescription": {"far": {"od": {"spheric": "-1.25", "axis": 90}}},
            "product": {
                "frame": {"id": 1},
                "glass_type": {"distance": "FAR"},
                "lens": {"title": "Single vision"},
                "price": "300.00"
            }
        })
    }

    #[test]
    fn catalog_choices_distinguish_ids_from_new_rows() {
        let s = submission(valid_payload());
        assert!(matches!(s.product.frame, CatalogChoice::Existing { id: 1 }));
        match &s.product.glass_type {
            CatalogChoice::New(g) => assert_eq!(g.distance, Distance::Far),
            other => panic!("expected a new glass type, got {:?}", other),
        }
        assert!(matches!(s.product.lens, CatalogChoice::New(_)));
    }

    #[test]
    fn id_cannot_be_mixed_with_new_attributes() {
        let mut payload = valid_payload();
        payload["product"]["frame"] = json!({"id": 1, "title": "X"});

        let err = serde_json::from_value::<TunnelSubmission>(payload).unwrap_err();
        assert!(err.to_string().contains("cannot be combined with `title`"), "{err}");
    }

    #[test]
    fn catalog_choice_errors_name_the_problem() {
        let err = serde_json::from_value::<CatalogChoice<FrameInput>>(json!({"id": "one"}))
            .unwrap_err();
        assert!(err.to_string().starts_with("id: "), "{err}");

        let err = serde_json::from_value::<CatalogChoice<GlassTypeInput>>(
            json!({"distance": "SIDEWAYS"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SIDEWAYS"), "{err}");

        let choice: CatalogChoice<GlassTypeInput> = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(choice, CatalogChoice::New(g) if g.distance == Distance::Near));
    }

    #[test]
    fn valid_submission_has_no_errors() {
        assert!(submission(valid_payload()).field_errors().is_empty());
    }

    #[test]
    fn errors_from_every_sub_form_are_collected() {
        let mut payload = valid_payload();
        payload["identity"]["first_name"] = json!("");
        payload["contact"]["phone_number"] = json!("abc");
        payload["prescription"]["far"]["od"]["axis"] = json!(200);
        payload["product"]["lens"] = json!({"title": "   "});
        payload["product"]["price"] = json!("-1.00");

        let errors = submission(payload).field_errors();
        for field in [
            "identity.first_name",
            "contact.phone_number",
            "prescription.far.od.axis",
            "product.lens.title",
            "product.price",
        ] {
            assert!(errors.contains(field), "missing error for {field}: {errors}");
        }
    }
}
