use std::time::{Duration, Instant};

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use tracing::{debug, warn};

/**
 * Requests slower than this are logged as warnings.
 */
const SLOW_REQUEST: Duration = Duration::from_secs(1);

/**
 * Middleware logging method, path, status and duration of every request on the `performance` target.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = Instant::now();
    let path = request.path().to_owned();
    let method = request.method().to_owned();
    let response = next.call(request).await;
    let status = match &response {
        Ok(service_response) => service_response.status().as_u16(),
        Err(err) => err.as_response_error().status_code().as_u16(),
    };
    let duration = start_time.elapsed();
    if duration > SLOW_REQUEST {
        warn!(target: "performance", "Slow request {} {} with status {} processed in {}ms", method, path, status, duration.as_millis());
    } else {
        debug!(target: "performance", "Request for {} {} with status {} processed in {}ms", method, path, status, duration.as_millis());
    }
    response
}

#[cfg(test)]
mod test {
    use actix_web::{App, HttpResponse, middleware::from_fn, test, web};

    use super::*;

    #[actix_web::test]
    async fn test_response_passes_through() {
        let app = test::init_service(App::new().wrap(from_fn(timing_middleware)).route("/ping", web::get().to(|| async { HttpResponse::Accepted().finish() }))).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(response.status().as_u16(), 202);
    }
}
