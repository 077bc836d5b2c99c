use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use super::{created_response, deleted_response, get_trace_id, list_response, updated_response};
use crate::{
    api::{
        rest::{ConsumptionBody, ListQuery},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{Consumption, ListFilter},
    },
};

/**
 * Creates a consumption.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createConsumption", trace_id = get_trace_id(&http_request), result))]
#[post("/api/consumptions")]
pub async fn create_consumption(http_request: HttpRequest, request_body: web::Json<ConsumptionBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let consumption = app_state.consumption_service.create(Consumption::from(request_body.into_inner())).instrument(span).await?;
    created_response::<_, ConsumptionBody>(&app_state.app_name, consumption)
}

/**
 * Replaces a consumption.
 */
#[instrument(skip(http_request, app_state), fields(service = "updateConsumption", trace_id = get_trace_id(&http_request), result))]
#[put("/api/consumptions/{id}")]
pub async fn update_consumption(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<ConsumptionBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let consumption = app_state.consumption_service.update(path.into_inner(), Consumption::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, ConsumptionBody>(&app_state.app_name, consumption)
}

/**
 * Updates the fields present in the body. Accepts `application/json` and `application/merge-patch+json`.
 */
#[instrument(skip(http_request, app_state), fields(service = "partialUpdateConsumption", trace_id = get_trace_id(&http_request), result))]
#[patch("/api/consumptions/{id}")]
pub async fn partial_update_consumption(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<ConsumptionBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let consumption = app_state.consumption_service.partial_update(path.into_inner(), Consumption::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, ConsumptionBody>(&app_state.app_name, consumption)
}

/**
 * Lists every consumption.
 */
#[instrument(skip(http_request, app_state), fields(service = "listConsumptions", trace_id = get_trace_id(&http_request), result))]
#[get("/api/consumptions")]
pub async fn list_consumptions(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let consumptions = app_state.consumption_service.find_all(&ListFilter::from(query.into_inner())).instrument(span).await?;
    Ok(list_response::<_, ConsumptionBody>(consumptions))
}

/**
 * Gets a consumption or 404.
 */
#[instrument(skip(http_request, app_state), fields(service = "getConsumption", trace_id = get_trace_id(&http_request), result))]
#[get("/api/consumptions/{id}")]
pub async fn get_consumption(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let consumption = app_state.consumption_service.find_one(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ConsumptionBody::from(consumption)))
}

/**
 * Deletes a consumption. Measures and methods of the consumption are kept without owner.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteConsumption", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/consumptions/{id}")]
pub async fn delete_consumption(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let id = path.into_inner();
    app_state.consumption_service.delete(id).instrument(span).await?;
    Ok(deleted_response::<Consumption>(&app_state.app_name, id))
}

#[cfg(test)]
mod test {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::api::endpoints::{configure, test_support::state_without_database};

    #[actix_web::test]
    async fn test_create_with_id_is_bad_request() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let request = test::TestRequest::post().uri("/api/consumptions").set_json(json!({"id": 1, "value": 1, "scope": "APP", "monitoringType": "EVOLUTION"})).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["errorKey"], "idexists");
        assert_eq!(body["entityName"], "consumptionDbConsumption");
    }

    #[actix_web::test]
    async fn test_update_validation() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let request = test::TestRequest::put().uri("/api/consumptions/1").set_json(json!({"value": 2})).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, request).await).await;
        assert_eq!(body["errorKey"], "idnull");
        let request = test::TestRequest::put().uri("/api/consumptions/1").set_json(json!({"id": 2, "value": 2})).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, request).await).await;
        assert_eq!(body["errorKey"], "idinvalid");
    }

    #[actix_web::test]
    async fn test_unknown_scope_is_rejected() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let request = test::TestRequest::post().uri("/api/consumptions").set_json(json!({"scope": "NONE"})).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status().as_u16(), 400);
    }
}
