//! HTTP handler functions for the area and market endpoints.

use actix_web::{HttpResponse, web};
use area_insights_area::queries;
use area_insights_area_models::{Area, PinCode};
use area_insights_server_models::{ApiHealth, ApiResponse, PinCodeBody};

use crate::AppState;
use crate::error::ApiError;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/areas/allAreas`
pub async fn all_areas(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(
        "All areas fetched successfully",
        queries::list_all(&state.dataset),
    ))
}

/// `GET /api/areas/served`
pub async fn served_areas(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(
        "Served areas fetched successfully",
        queries::list_served(&state.dataset),
    ))
}

/// `GET /api/areas/servedArea-with-data`
///
/// Served areas merged with their statistics row, or `null` stats.
pub async fn served_with_data(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(
        "Served areas with data fetched successfully",
        queries::served_with_data(&state.dataset),
    ))
}

/// `GET /api/areas/area-stats/{pinCode}`
///
/// Operational statistics for served areas; an encyclopedia summary or
/// fallback statistics for unserved ones.
pub async fn area_stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let pin_code = parse_pin(&path)?;
    let view = queries::area_stats(&state.dataset, state.summaries.as_ref(), pin_code).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Area stats fetched successfully", view)))
}

/// `POST /api/areas/getSalary`
///
/// Salary distribution of the companies found in an area.
pub async fn salary(
    state: web::Data<AppState>,
    body: web::Json<PinCodeBody>,
) -> Result<HttpResponse, ApiError> {
    let area = find_area(&state, body.pin_code)?;
    let distribution = state.salary.salary_distribution(area).await.map_err(|e| {
        log::warn!("Salary data for {} unavailable: {e}", area.name);
        ApiError::Unavailable("Salary data is currently unavailable".to_string())
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Salary data fetched successfully",
        distribution,
    )))
}

/// `POST /api/areas/getRentPrice`
///
/// Rent distribution of the listings in an area.
pub async fn rent_price(
    state: web::Data<AppState>,
    body: web::Json<PinCodeBody>,
) -> Result<HttpResponse, ApiError> {
    let area = find_area(&state, body.pin_code)?;
    let distribution = state.rent.rent_distribution(area).await.map_err(|e| {
        log::warn!("Rent data for {} unavailable: {e}", area.name);
        ApiError::Unavailable("Rent data is currently unavailable".to_string())
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Rent data fetched successfully",
        distribution,
    )))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error("Route not found"))
}

/// A path segment that is not a pin code cannot name an area.
fn parse_pin(raw: &str) -> Result<PinCode, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Area not found".to_string()))
}

fn find_area(state: &AppState, pin_code: PinCode) -> Result<&Area, ApiError> {
    state
        .dataset
        .area(pin_code)
        .ok_or_else(|| ApiError::NotFound("Area not found".to_string()))
}
