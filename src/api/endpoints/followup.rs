//! Follow-up endpoints.
//!
//! `GET /api/followup/recurring?min_visits=N`: recurring patients.
//! `GET /api/followup/inactive?days=N`: patients past the inactivity window.
//! `GET /api/followup/patients/:id/pattern`: visit pattern for one patient.
//! `GET /api/followup/patients/:id/recommendations`: follow-up bundle.
//! `POST /api/followup/patients/:id/dispatch`: forward the bundle's actions.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run_blocking;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::MAX_DAY_SPAN;
use crate::followup::{
    forward_actions, DispatchReport, InactivePatient, PatternOutcome, RecommendationBundle,
    RecurringPatient,
};

#[derive(Debug, Deserialize)]
pub struct RecurringQuery {
    pub min_visits: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct InactiveQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct RecurringResponse {
    pub min_visits: u32,
    pub patients: Vec<RecurringPatient>,
}

#[derive(Serialize)]
pub struct InactiveResponse {
    pub inactivity_days: i64,
    pub patients: Vec<InactivePatient>,
}

#[derive(Serialize)]
pub struct DispatchResponse {
    pub patient_id: Uuid,
    pub actions: usize,
    #[serde(flatten)]
    pub report: DispatchReport,
}

fn parse_patient_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid patient id: {raw}")))
}

fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// `GET /api/followup/recurring`
pub async fn recurring(
    State(ctx): State<ApiContext>,
    query: Result<Query<RecurringQuery>, QueryRejection>,
) -> Result<Json<RecurringResponse>, ApiError> {
    let Query(query) = query.map_err(bad_query)?;
    let min_visits = query
        .min_visits
        .unwrap_or(ctx.engine.config().default_min_visits);
    if min_visits == 0 {
        return Err(ApiError::BadRequest("min_visits must be at least 1".into()));
    }

    let engine = ctx.engine.clone();
    let patients = run_blocking(move || {
        engine
            .find_recurring_patients(Some(min_visits))
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(RecurringResponse {
        min_visits,
        patients,
    }))
}

/// `GET /api/followup/inactive`
pub async fn inactive(
    State(ctx): State<ApiContext>,
    query: Result<Query<InactiveQuery>, QueryRejection>,
) -> Result<Json<InactiveResponse>, ApiError> {
    let Query(query) = query.map_err(bad_query)?;
    let inactivity_days = query
        .days
        .unwrap_or(ctx.engine.config().default_inactivity_days);
    if !(0..=MAX_DAY_SPAN).contains(&inactivity_days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 0 and {MAX_DAY_SPAN}"
        )));
    }

    let engine = ctx.engine.clone();
    let patients = run_blocking(move || {
        engine
            .find_inactive_patients(Some(inactivity_days))
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(InactiveResponse {
        inactivity_days,
        patients,
    }))
}

/// `GET /api/followup/patients/:id/pattern`
pub async fn pattern(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatternOutcome>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let engine = ctx.engine.clone();
    let outcome =
        run_blocking(move || engine.analyze_patient(&patient_id).map_err(ApiError::from)).await?;
    Ok(Json(outcome))
}

/// `GET /api/followup/patients/:id/recommendations`
pub async fn recommendations(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<RecommendationBundle>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let engine = ctx.engine.clone();
    let bundle = run_blocking(move || {
        engine
            .recommend_for_patient(&patient_id)
            .map_err(ApiError::from)
    })
    .await?;
    Ok(Json(bundle))
}

/// `POST /api/followup/patients/:id/dispatch`
pub async fn dispatch(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let engine = ctx.engine.clone();
    let dispatcher = ctx.dispatcher.clone();
    let response = run_blocking(move || {
        let bundle = engine
            .recommend_for_patient(&patient_id)
            .map_err(ApiError::from)?;
        let report = forward_actions(dispatcher.as_ref(), &bundle);
        Ok(DispatchResponse {
            patient_id,
            actions: bundle.actions.len(),
            report,
        })
    })
    .await?;

    tracing::info!(
        patient_id = %patient_id,
        delivered = response.report.delivered,
        failed = response.report.failed,
        "Follow-up actions dispatched"
    );
    Ok(Json(response))
}
