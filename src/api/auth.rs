// Session gate for the API: every non-public path needs an authenticated session.

use actix_web::{
    body::{BoxBody, EitherBody},
    cookie::{Cookie, SameSite},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::database_ops::db::Db;
use crate::database_ops::users::find_session;

pub const SESSION_COOKIE: &str = "gamerank_session";
pub const LOGIN_PATH: &str = "/login";

const PUBLIC_PATHS: [&str; 4] = ["/", "/health", LOGIN_PATH, "/logout"];
const PUBLIC_PREFIXES: [&str; 1] = ["/static/"];

/// Identity attached to a request once the gate has let it through.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub token: String,
}

/// Attributes of the session cookie handed out at login.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieConfig {
    pub secure: bool,
}

impl CookieConfig {
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish()
    }
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Session token from the cookie, or from an `Authorization: Bearer` header.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn login_redirect(path: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={next}")
}

pub struct SessionGate;

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionGateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_path(req.path()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let db = req.app_data::<web::Data<Db>>().cloned();
            let token = session_token(req.request());
            let session = match (db, token) {
                (Some(db), Some(token)) => find_session(&db, &token)
                    .await
                    .map_err(actix_web::error::ErrorInternalServerError)?,
                _ => None,
            };

            match session {
                Some(session) if session.auth => {
                    req.extensions_mut().insert(SessionUser {
                        user_id: session.user_id,
                        token: session.token,
                    });
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                _ => {
                    tracing::debug!(path = req.path(), "no authenticated session; redirecting");
                    let response = HttpResponse::SeeOther()
                        .insert_header((header::LOCATION, login_redirect(req.path())))
                        .finish()
                        .map_into_right_body();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}
