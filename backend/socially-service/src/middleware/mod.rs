/// Session authentication for socially-service
///
/// [`SessionAuthMiddleware`] verifies an `Authorization: Bearer` session token
/// when one is sent and attaches the caller's [`Identity`]. Requests without a
/// verifiable token pass through anonymously, so public reads keep working
/// with a stale session. Protected handlers take an [`Identity`] argument,
/// which answers 401 when none is attached.
use crate::error::AppError;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::jwt::{self, SessionClaims};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Authenticated caller as asserted by the identity provider
#[derive(Debug, Clone)]
pub struct Identity(pub SessionClaims);

impl Identity {
    /// Identity-provider subject
    pub fn subject(&self) -> &str {
        &self.0.sub
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.0
    }
}

/// Pull the token out of an `Authorization` header value
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Actix middleware that verifies identity-provider session tokens.
pub struct SessionAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().ok().and_then(bearer_token).map(str::to_string));

            match header {
                // Anonymous request
                None => {}
                Some(None) => {
                    tracing::debug!(path = %req.path(), "Malformed Authorization header");
                }
                Some(Some(token)) => match jwt::validate_session_token(&token) {
                    Ok(data) => {
                        req.extensions_mut().insert(Identity(data.claims));
                    }
                    Err(e) => {
                        tracing::debug!(path = %req.path(), error = %e, "Session token rejected");
                    }
                },
            }

            service.call(req).await
        })
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or_else(AppError::unauthorized),
        )
    }
}
