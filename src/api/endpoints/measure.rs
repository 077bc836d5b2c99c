use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use super::{created_response, deleted_response, get_trace_id, list_response, updated_response};
use crate::{
    api::{
        rest::{MeasureBody, ListQuery},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{Measure, ListFilter},
    },
};

/**
 * Creates a measure.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createMeasure", trace_id = get_trace_id(&http_request), result))]
#[post("/api/measures")]
pub async fn create_measure(http_request: HttpRequest, request_body: web::Json<MeasureBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let measure = app_state.measure_service.create(Measure::from(request_body.into_inner())).instrument(span).await?;
    created_response::<_, MeasureBody>(&app_state.app_name, measure)
}

/**
 * Replaces a measure.
 */
#[instrument(skip(http_request, app_state), fields(service = "updateMeasure", trace_id = get_trace_id(&http_request), result))]
#[put("/api/measures/{id}")]
pub async fn update_measure(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<MeasureBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let measure = app_state.measure_service.update(path.into_inner(), Measure::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, MeasureBody>(&app_state.app_name, measure)
}

/**
 * Updates the fields present in the body. Accepts `application/json` and `application/merge-patch+json`.
 */
#[instrument(skip(http_request, app_state), fields(service = "partialUpdateMeasure", trace_id = get_trace_id(&http_request), result))]
#[patch("/api/measures/{id}")]
pub async fn partial_update_measure(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<MeasureBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let measure = app_state.measure_service.partial_update(path.into_inner(), Measure::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, MeasureBody>(&app_state.app_name, measure)
}

/**
 * Lists every measure.
 */
#[instrument(skip(http_request, app_state), fields(service = "listMeasures", trace_id = get_trace_id(&http_request), result))]
#[get("/api/measures")]
pub async fn list_measures(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let measures = app_state.measure_service.find_all(&ListFilter::from(query.into_inner())).instrument(span).await?;
    Ok(list_response::<_, MeasureBody>(measures))
}

#[instrument(skip(http_request, app_state), fields(service = "getMeasure", trace_id = get_trace_id(&http_request), result))]
#[get("/api/measures/{id}")]
pub async fn get_measure(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let measure = app_state.measure_service.find_one(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(MeasureBody::from(measure)))
}

#[instrument(skip(http_request, app_state), fields(service = "deleteMeasure", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/measures/{id}")]
pub async fn delete_measure(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let id = path.into_inner();
    app_state.measure_service.delete(id).instrument(span).await?;
    Ok(deleted_response::<Measure>(&app_state.app_name, id))
}
