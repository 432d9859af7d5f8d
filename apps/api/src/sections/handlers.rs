//! Generic section controller. One set of handlers, instantiated per section
//! type in `sections::routes`.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{self, ApiJson};
use crate::models::sections::{Section, SectionRow};
use crate::resumes::store::ensure_owned;
use crate::sections::store;
use crate::state::AppState;
use crate::validation::{check_non_negative, FieldErrors};

/// Create/update body: the section's own fields plus an optional `order`.
#[derive(Debug)]
pub struct SectionInput<T> {
    pub order: Option<i32>,
    pub data: T,
}

impl<T: DeserializeOwned> SectionInput<T> {
    /// Splits `order` off the object and decodes the rest as `T`, keeping
    /// field paths in any decode error.
    pub fn from_value(mut body: Value) -> Result<Self, AppError> {
        let Value::Object(fields) = &mut body else {
            return Err(AppError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        };
        let order = match fields.remove("order") {
            None | Some(Value::Null) => None,
            Some(order) => {
                let mut wrapped = serde_json::Map::new();
                wrapped.insert("order".to_string(), order);
                extract::from_value::<OrderOnly>(Value::Object(wrapped))?.order
            }
        };
        Ok(Self {
            order,
            data: extract::from_value(body)?,
        })
    }
}

#[derive(Deserialize)]
struct OrderOnly {
    order: Option<i32>,
}

#[async_trait]
impl<T, S> FromRequest<S> for SectionInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(body) = ApiJson::<Value>::from_request(req, state).await?;
        Self::from_value(body)
    }
}

impl<T: Section> SectionInput<T> {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.data.validate() {
            Ok(()) => FieldErrors::default(),
            Err(errors) => errors,
        };
        check_non_negative(&mut errors, "order", self.order);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct BulkReplace<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

fn item_not_found<T: Section>(item_id: i64) -> AppError {
    AppError::NotFound(format!("{} entry {item_id} not found", T::PATH))
}

/// Shallow JSON merge: every key present in `patch` replaces the stored value.
fn merge_patch(target: &mut Value, patch: Value) -> Result<(), AppError> {
    let (Value::Object(target), Value::Object(patch)) = (target, patch) else {
        return Err(AppError::Validation(
            "PATCH body must be a JSON object".to_string(),
        ));
    };
    for (key, value) in patch {
        target.insert(key, value);
    }
    Ok(())
}

/// GET /api/v1/resumes/:resume_id/{section}
pub async fn list_items<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<SectionRow<T>>>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::list::<T>(&state.db, resume_id).await?))
}

/// POST /api/v1/resumes/:resume_id/{section}
pub async fn create_item<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    input: SectionInput<T>,
) -> Result<(StatusCode, Json<SectionRow<T>>), AppError> {
    input.validate()?;
    ensure_owned(&state.db, resume_id, user_id).await?;

    let row = store::create(&state.db, resume_id, input.order, &input.data).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/resumes/:resume_id/{section}/:item_id
pub async fn get_item<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, item_id)): Path<(Uuid, i64)>,
) -> Result<Json<SectionRow<T>>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    store::get::<T>(&state.db, resume_id, item_id)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found::<T>(item_id))
}

/// PUT /api/v1/resumes/:resume_id/{section}/:item_id
pub async fn update_item<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, item_id)): Path<(Uuid, i64)>,
    input: SectionInput<T>,
) -> Result<Json<SectionRow<T>>, AppError> {
    input.validate()?;
    ensure_owned(&state.db, resume_id, user_id).await?;

    let order = match input.order {
        Some(order) => order,
        None => {
            store::get::<T>(&state.db, resume_id, item_id)
                .await?
                .ok_or_else(|| item_not_found::<T>(item_id))?
                .order
        }
    };

    store::update(&state.db, resume_id, item_id, order, &input.data)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found::<T>(item_id))
}

/// PATCH /api/v1/resumes/:resume_id/{section}/:item_id
/// Merges the body onto the stored entry, then validates the result as a whole.
pub async fn patch_item<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, item_id)): Path<(Uuid, i64)>,
    ApiJson(patch): ApiJson<Value>,
) -> Result<Json<SectionRow<T>>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;

    let existing = store::get::<T>(&state.db, resume_id, item_id)
        .await?
        .ok_or_else(|| item_not_found::<T>(item_id))?;

    let mut merged = serde_json::to_value(&existing).map_err(anyhow::Error::from)?;
    merge_patch(&mut merged, patch)?;
    let input = SectionInput::<T>::from_value(merged)?;
    input.validate()?;

    let order = input.order.unwrap_or(existing.order);
    store::update(&state.db, resume_id, item_id, order, &input.data)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found::<T>(item_id))
}

/// DELETE /api/v1/resumes/:resume_id/{section}/:item_id
pub async fn delete_item<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, item_id)): Path<(Uuid, i64)>,
) -> Result<StatusCode, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    if store::delete::<T>(&state.db, resume_id, item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(item_not_found::<T>(item_id))
    }
}

/// POST /api/v1/resumes/:resume_id/{section}/bulk-update
/// All-or-nothing: one invalid item rejects the whole batch before any write.
pub async fn bulk_update<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(body): ApiJson<BulkReplace<T>>,
) -> Result<Json<Vec<SectionRow<T>>>, AppError> {
    validate_batch(&body.items)?;
    ensure_owned(&state.db, resume_id, user_id).await?;

    let rows = store::replace_all(&state.db, resume_id, &body.items).await?;
    info!(
        section = T::PATH,
        %resume_id,
        count = rows.len(),
        "section replaced"
    );
    Ok(Json(rows))
}

/// POST /api/v1/resumes/:resume_id/{section}/reorder
pub async fn reorder_items<T: Section>(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<SectionRow<T>>>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::reorder::<T>(&state.db, resume_id, &body.ids).await?))
}

fn validate_batch<T: Section>(items: &[T]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    for (index, item) in items.iter().enumerate() {
        if let Err(item_errors) = item.validate() {
            errors.extend_prefixed(&format!("items[{index}]"), item_errors);
        }
    }
    errors.into_result()
}
