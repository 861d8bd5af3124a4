use crate::http::{make_boxed_error_response, make_boxed_response};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

/// Serves `/health` and `/ready` for orchestrator probes.
///
/// `/health` always answers once the process accepts connections. `/ready`
/// consults the `is_ready` callback on every request, so readiness tracks
/// configuration that can change while the process runs.
pub struct AdminService<F> {
    is_ready: F,
}

impl<F> AdminService<F>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self { is_ready }
    }
}

impl<F> Service<Request<Incoming>> for AdminService<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let is_ready = (self.is_ready)();
        let is_get = req.method() == Method::GET;

        Box::pin(async move {
            let res = match (is_get, req.uri().path()) {
                (false, "/health" | "/ready") => {
                    make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED)
                }
                (true, "/health") => make_boxed_response(StatusCode::OK, "ok\n"),
                (true, "/ready") => match is_ready {
                    true => make_boxed_response(StatusCode::OK, "ok\n"),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
