use crate::utils::{bytes_to_payload, get_header_value};
use actix_web::body::{self, BoxBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;
use tracing::instrument;

/// Paths whose bodies carry codes, camera frames or documents, or aren't JSON.
const UNLOGGED_PATHS: [&str; 5] = [
    "/docs/",
    "/api-docs/",
    "/verification/otp/verify",
    "/verification/liveness/frame",
    "/document/submit",
];

fn is_unlogged(path: &str) -> bool {
    UNLOGGED_PATHS.iter().any(|prefix| path.starts_with(prefix))
}

// Middleware for saving the request and response into the tracing
pub struct ReadReqResMiddleware<S> {
    service: Rc<RefCell<S>>,
}

impl<S> Service<ServiceRequest> for ReadReqResMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    #[instrument(skip(self), name = "Request Response Payload", fields(path = %req.path()))]
    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        if is_unlogged(req.path()) {
            return Box::pin(async move { svc.call(req).await });
        }
        let request_id = get_header_value(&req, "x-request-id").unwrap_or_default();
        Box::pin(async move {
            let request_str: String = req.extract::<String>().await?;
            tracing::info!({%request_str, %request_id}, "HTTP Request");
            req.set_payload(bytes_to_payload(web::Bytes::from(request_str)));
            let fut = svc.call(req).await?;

            let (req, res) = fut.into_parts();
            let (res, body) = res.into_parts();
            let response_str = match body::to_bytes(body).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => {
                    tracing::error!("Error reading response body");
                    String::new()
                }
            };
            tracing::info!({%response_str, %request_id}, "HTTP Response");
            let res = res.set_body(BoxBody::new(response_str));
            Ok(ServiceResponse::new(req, res))
        })
    }
}

pub struct SaveRequestResponse;

impl<S> Transform<S, ServiceRequest> for SaveRequestResponse
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ReadReqResMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ReadReqResMiddleware {
            service: Rc::new(RefCell::new(service)),
        }))
    }
}
