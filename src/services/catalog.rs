use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::glass_type::{Distance, Treatment};
use crate::entities::{frame, glass_type, lens, product};
use crate::errors::ServiceError;
use crate::validation::validate_not_blank;

/// Frames, glass types and lenses that products are assembled from.
///
/// Rows referenced by a product cannot be deleted.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ---- frames ----

    #[instrument(skip(self))]
    pub async fn list_frames(
        &self,
        search: Option<String>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<FrameView>, u64), ServiceError> {
        let mut query = frame::Entity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(frame::Column::Title.contains(term));
        }
        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(frame::Column::Title)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(FrameView::from).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_frame(&self, id: i32) -> Result<FrameView, ServiceError> {
        frame::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(FrameView::from)
            .ok_or_else(|| ServiceError::not_found("Frame", id))
    }

    #[instrument(skip(self))]
    pub async fn create_frame(&self, input: FrameInput) -> Result<FrameView, ServiceError> {
        input.validate()?;
        let created = input.into_active_model().insert(&*self.db).await?;
        info!(frame_id = created.id, "Created frame");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn update_frame(&self, id: i32, input: FrameInput) -> Result<FrameView, ServiceError> {
        input.validate()?;
        let model = frame::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Frame", id))?;
        let mut active: frame::ActiveModel = model.into();
        active.title = Set(input.title.trim().to_string());
        Ok(active.update(&*self.db).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_frame(&self, id: i32) -> Result<(), ServiceError> {
        self.get_frame(id).await?;
        let used_by = product::Entity::find()
            .filter(product::Column::FrameId.eq(id))
            .count(&*self.db)
            .await?;
        if used_by > 0 {
            warn!(frame_id = id, used_by, "Refusing to delete referenced frame");
            return Err(in_use("Frame", id, used_by));
        }
        frame::Entity::delete_by_id(id).exec(&*self.db).await?;
        info!(frame_id = id, "Deleted frame");
        Ok(())
    }

    // ---- glass types ----

    #[instrument(skip(self))]
    pub async fn list_glass_types(
        &self,
        distance: Option<Distance>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<GlassTypeView>, u64), ServiceError> {
        let mut query = glass_type::Entity::find();
        if let Some(distance) = distance {
            query = query.filter(glass_type::Column::Distance.eq(distance));
        }
        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(glass_type::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(GlassTypeView::from).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_glass_type(&self, id: i32) -> Result<GlassTypeView, ServiceError> {
        glass_type::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(GlassTypeView::from)
            .ok_or_else(|| ServiceError::not_found("Glass type", id))
    }

    #[instrument(skip(self))]
    pub async fn create_glass_type(
        &self,
        input: GlassTypeInput,
    ) -> Result<GlassTypeView, ServiceError> {
        let created = input.into_active_model().insert(&*self.db).await?;
        info!(glass_type_id = created.id, label = %created.label(), "Created glass type");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn update_glass_type(
        &self,
        id: i32,
        input: GlassTypeInput,
    ) -> Result<GlassTypeView, ServiceError> {
        let model = glass_type::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Glass type", id))?;
        let mut active: glass_type::ActiveModel = model.into();
        active.distance = Set(input.distance);
        active.treatment = Set(input.treatment);
        Ok(active.update(&*self.db).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_glass_type(&self, id: i32) -> Result<(), ServiceError> {
        self.get_glass_type(id).await?;
        let used_by = product::Entity::find()
            .filter(product::Column::GlassTypeId.eq(id))
            .count(&*self.db)
            .await?;
        if used_by > 0 {
            warn!(glass_type_id = id, used_by, "Refusing to delete referenced glass type");
            return Err(in_use("Glass type", id, used_by));
        }
        glass_type::Entity::delete_by_id(id).exec(&*self.db).await?;
        info!(glass_type_id = id, "Deleted glass type");
        Ok(())
    }

    // ---- lenses ----

    #[instrument(skip(self))]
    pub async fn list_lenses(
        &self,
        search: Option<String>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<LensView>, u64), ServiceError> {
        let mut query = lens::Entity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(lens::Column::Title.contains(term));
        }
        let total = query.clone().count(&*self.db).await?;
        let rows = query
            .order_by_asc(lens::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((rows.into_iter().map(LensView::from).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_lens(&self, id: i32) -> Result<LensView, ServiceError> {
        lens::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(LensView::from)
            .ok_or_else(|| ServiceError::not_found("Lens", id))
    }

    #[instrument(skip(self))]
    pub async fn create_lens(&self, input: LensInput) -> Result<LensView, ServiceError> {
        input.validate()?;
        let created = input.into_active_model().insert(&*self.db).await?;
        info!(lens_id = created.id, "Created lens");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn update_lens(&self, id: i32, input: LensInput) -> Result<LensView, ServiceError> {
        input.validate()?;
        let model = lens::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Lens", id))?;
        let mut active: lens::ActiveModel = model.into();
        active.title = Set(input.title.trim().to_string());
        Ok(active.update(&*self.db).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_lens(&self, id: i32) -> Result<(), ServiceError> {
        self.get_lens(id).await?;
        let used_by = product::Entity::find()
            .filter(product::Column::LensId.eq(id))
            .count(&*self.db)
            .await?;
        if used_by > 0 {
            warn!(lens_id = id, used_by, "Refusing to delete referenced lens");
            return Err(in_use("Lens", id, used_by));
        }
        lens::Entity::delete_by_id(id).exec(&*self.db).await?;
        info!(lens_id = id, "Deleted lens");
        Ok(())
    }
}

fn in_use(entity: &str, id: i32, used_by: u64) -> ServiceError {
    ServiceError::Conflict(format!(
        "{} {} is used by {} product(s) and cannot be deleted",
        entity, id, used_by
    ))
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct FrameInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    #[schema(example = "Ray-Ban Aviator")]
    pub title: String,
}

impl FrameInput {
    pub fn into_active_model(self) -> frame::ActiveModel {
        frame::ActiveModel {
            title: Set(self.title.trim().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct GlassTypeInput {
    /// Defaults to `NEAR`
    #[serde(default)]
    pub distance: Distance,
    pub treatment: Option<Treatment>,
}

impl GlassTypeInput {
    pub fn into_active_model(self) -> glass_type::ActiveModel {
        glass_type::ActiveModel {
            distance: Set(self.distance),
            treatment: Set(self.treatment),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LensInput {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Single vision 1.6 index")]
    pub title: String,
}

impl LensInput {
    pub fn into_active_model(self) -> lens::ActiveModel {
        lens::ActiveModel {
            title: Set(self.title.trim().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FrameView {
    pub id: i32,
    pub title: String,
}

impl From<frame::Model> for FrameView {
    fn from(model: frame::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlassTypeView {
    pub id: i32,
    pub distance: Distance,
    pub treatment: Option<Treatment>,
    #[schema(example = "Near, Anti-Reflective")]
    pub label: String,
}

impl From<glass_type::Model> for GlassTypeView {
    fn from(model: glass_type::Model) -> Self {
        Self {
            label: model.label(),
            id: model.id,
            distance: model.distance,
            treatment: model.treatment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LensView {
    pub id: i32,
    pub title: String,
}

impl From<lens::Model> for LensView {
    fn from(model: lens::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glass_type_input_defaults_to_near_without_treatment() {
        let input: GlassTypeInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.distance, Distance::Near);
        assert!(input.treatment.is_none());
    }

    #[test]
    fn frame_title_must_not_be_blank_or_too_long() {
        assert!(FrameInput { title: "  ".into() }.validate().is_err());
        assert!(FrameInput { title: "x".repeat(201) }.validate().is_err());
        assert!(FrameInput { title: "Round".into() }.validate().is_ok());
    }

    #[test]
    fn conflict_message_names_the_row() {
        let err = in_use("Frame", 3, 2);
        assert_eq!(
            err.to_string(),
            "Conflict: Frame 3 is used by 2 product(s) and cannot be deleted"
        );
    }
}
