use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::SupplierType,
    errors::ApiError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input,
    },
    services::suppliers::{NewContact, NewSupplier, SupplierDetails, SupplierUpdate},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactPayload {
    #[validate(email(message = "Contact email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub street: String,
    #[validate(length(min = 1, max = 20))]
    pub house_number: String,
}

impl From<ContactPayload> for NewContact {
    fn from(payload: ContactPayload) -> Self {
        NewContact {
            email: payload.email,
            country: payload.country,
            city: payload.city,
            street: payload.street,
            house_number: payload.house_number,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    pub supplier_type: SupplierType,
    pub parent_id: Option<i64>,
    #[validate]
    pub contact: ContactPayload,
    #[serde(default)]
    pub product_ids: Vec<i64>,
    #[serde(default)]
    pub employee_ids: Vec<i64>,
}

/// PUT semantics: scalar fields are replaced wholesale, `None` collections
/// and contact leave the existing values in place.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    pub supplier_type: SupplierType,
    pub parent_id: Option<i64>,
    #[validate]
    pub contact: Option<ContactPayload>,
    pub product_ids: Option<Vec<i64>>,
    pub employee_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

#[derive(Debug, Serialize)]
pub struct SupplierResponse {
    pub id: i64,
    pub title: String,
    pub supplier_type: SupplierType,
    pub debt: Decimal,
    pub level: u32,
    pub parent_id: Option<i64>,
    pub contact: ContactResponse,
    pub product_ids: Vec<i64>,
    pub employee_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<SupplierDetails> for SupplierResponse {
    fn from(details: SupplierDetails) -> Self {
        let supplier = details.supplier;
        let contact = details.contact;
        SupplierResponse {
            id: supplier.id,
            title: supplier.title,
            supplier_type: supplier.supplier_type,
            debt: supplier.debt,
            level: details.level,
            parent_id: supplier.parent_id,
            contact: ContactResponse {
                id: contact.id,
                email: contact.email,
                country: contact.country,
                city: contact.city,
                street: contact.street,
                house_number: contact.house_number,
            },
            product_ids: details.product_ids,
            employee_ids: details.employee_ids,
            created_at: supplier.created_at,
            updated_at: supplier.updated_at,
        }
    }
}

pub fn supplier_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/by_product", get(list_by_product))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

/// Lists the caller's suppliers filtered by contact country. Without a
/// usable `country` parameter the result is an empty list, not an error.
async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(country) = country_filter(&params) else {
        return Ok(success_response(Vec::<SupplierResponse>::new()));
    };

    let details = state
        .services
        .suppliers
        .list_by_country(user.user_id, &country)
        .await?;

    Ok(success_response(into_responses(details)))
}

/// Lists the caller's suppliers that carry a given product. A missing or
/// malformed `product_id` yields an empty list.
async fn list_by_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(product_id) = product_id_filter(&params) else {
        return Ok(success_response(Vec::<SupplierResponse>::new()));
    };

    let details = state
        .services
        .suppliers
        .list_by_product(user.user_id, product_id)
        .await?;

    Ok(success_response(into_responses(details)))
}

/// Suppliers of the caller whose debt is above the network-wide average.
pub async fn debt_statistics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .suppliers
        .list_debt_above_average(user.user_id)
        .await?;

    Ok(success_response(into_responses(details)))
}

async fn create_supplier(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .suppliers
        .create(NewSupplier {
            title: payload.title,
            supplier_type: payload.supplier_type,
            parent_id: payload.parent_id,
            contact: payload.contact.into(),
            product_ids: payload.product_ids,
            employee_ids: payload.employee_ids,
        })
        .await?;

    let details = state
        .services
        .suppliers
        .get(created.id)
        .await?
        .ok_or(ApiError::InternalServerError)?;

    Ok(created_response(SupplierResponse::from(details)))
}

async fn get_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .suppliers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("supplier {}", id)))?;

    ensure_visible(&user, &details)?;
    Ok(success_response(SupplierResponse::from(details)))
}

async fn update_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let existing = state
        .services
        .suppliers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("supplier {}", id)))?;
    ensure_visible(&user, &existing)?;

    state
        .services
        .suppliers
        .update(
            id,
            SupplierUpdate {
                title: payload.title,
                supplier_type: payload.supplier_type,
                parent_id: payload.parent_id,
                contact: payload.contact.map(NewContact::from),
                product_ids: payload.product_ids,
                employee_ids: payload.employee_ids,
            },
        )
        .await?;

    let details = state
        .services
        .suppliers
        .get(id)
        .await?
        .ok_or(ApiError::InternalServerError)?;

    Ok(success_response(SupplierResponse::from(details)))
}

async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = state
        .services
        .suppliers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("supplier {}", id)))?;
    ensure_visible(&user, &existing)?;

    state.services.suppliers.delete(id).await?;
    Ok(no_content_response())
}

/// A supplier is visible to its employees and to administrators. Hidden
/// suppliers look like they do not exist.
fn ensure_visible(user: &AuthUser, details: &SupplierDetails) -> Result<(), ApiError> {
    if user.is_admin() || details.employee_ids.contains(&user.user_id) {
        return Ok(());
    }
    Err(ApiError::NotFound(format!(
        "supplier {}",
        details.supplier.id
    )))
}

fn into_responses(details: Vec<SupplierDetails>) -> Vec<SupplierResponse> {
    details.into_iter().map(SupplierResponse::from).collect()
}

fn country_filter(params: &HashMap<String, String>) -> Option<String> {
    let country = params.get("country")?.trim();
    if country.is_empty() {
        return None;
    }
    Some(country.to_string())
}

fn product_id_filter(params: &HashMap<String, String>) -> Option<i64> {
    params.get("product_id")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_country_disables_the_filter() {
        assert_eq!(country_filter(&params(&[])), None);
        assert_eq!(country_filter(&params(&[("country", "  ")])), None);
    }

    #[test]
    fn country_is_trimmed() {
        assert_eq!(
            country_filter(&params(&[("country", " Japan ")])),
            Some("Japan".to_string())
        );
    }

    #[test]
    fn malformed_product_id_disables_the_filter() {
        assert_eq!(product_id_filter(&params(&[])), None);
        assert_eq!(product_id_filter(&params(&[("product_id", "abc")])), None);
        assert_eq!(product_id_filter(&params(&[("product_id", "")])), None);
    }

    #[test]
    fn numeric_product_id_is_parsed() {
        assert_eq!(
            product_id_filter(&params(&[("product_id", " 42 ")])),
            Some(42)
        );
    }

    #[test]
    fn admin_sees_every_supplier() {
        let admin = AuthUser {
            user_id: 999,
            username: Some("root".to_string()),
            roles: vec!["admin".to_string()],
        };
        let details = sample_details(vec![1, 2]);
        assert!(ensure_visible(&admin, &details).is_ok());
    }

    #[test]
    fn non_employee_gets_not_found() {
        let user = AuthUser {
            user_id: 7,
            username: Some("worker".to_string()),
            roles: vec![],
        };
        let details = sample_details(vec![1, 2]);
        assert!(matches!(
            ensure_visible(&user, &details),
            Err(ApiError::NotFound(_))
        ));
    }

    fn sample_details(employee_ids: Vec<i64>) -> SupplierDetails {
        SupplierDetails {
            supplier: crate::entities::supplier::Model {
                id: 10,
                title: "Acme".to_string(),
                supplier_type: SupplierType::Factory,
                debt: Decimal::ZERO,
                contact_id: 5,
                parent_id: None,
                created_at: Utc::now(),
                updated_at: None,
            },
            contact: crate::entities::contact::Model {
                id: 5,
                email: "acme@example.com".to_string(),
                country: "Japan".to_string(),
                city: "Tokyo".to_string(),
                street: "Main".to_string(),
                house_number: "1".to_string(),
            },
            level: 0,
            product_ids: vec![],
            employee_ids,
        }
    }
}
