//! HTTP surface: the GraphQL endpoint, session cookies and health checks.

pub mod graphql;
mod middleware;
mod session_cookie;

pub use session_cookie::{SESSION_COOKIE, SessionCookieSettings};

use std::sync::Arc;
use std::time::Instant;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware as axum_middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use metrics::{counter, histogram};
use sqlx::Error as SqlxError;
use tower_http::cors::CorsLayer;

use crate::application::error::{AppError, ErrorReport};
use crate::application::sessions::{SessionHandle, SessionStore};
use crate::infra::db::PostgresRepositories;
use crate::infra::telemetry::{GRAPHQL_ERRORS_TOTAL, GRAPHQL_REQUEST_MS, GRAPHQL_REQUESTS_TOTAL};

use self::graphql::{AppSchema, LoaderFactory, prepare_request};
use self::middleware::{log_responses, set_request_context};

const GRAPHQL_PATH: &str = "/graphql";

#[derive(Clone)]
pub struct HttpState {
    pub schema: AppSchema,
    pub sessions: SessionStore,
    pub loaders: LoaderFactory,
    pub cookies: SessionCookieSettings,
    pub db: Arc<PostgresRepositories>,
    pub playground: bool,
}

/// Assemble the router. `cors_origin` is the web client allowed to send credentials.
pub fn build_router(state: HttpState, cors_origin: &str) -> Result<Router, AppError> {
    let origin = HeaderValue::from_str(cors_origin)
        .map_err(|err| AppError::validation(format!("invalid CORS origin `{cors_origin}`: {err}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let router = Router::new()
        .route(GRAPHQL_PATH, get(playground).post(graphql_handler))
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(cors)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context));

    Ok(router)
}

async fn graphql_handler(
    State(state): State<HttpState>,
    jar: CookieJar,
    request: GraphQLRequest,
) -> Response {
    let cookie = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let session = match SessionHandle::resume(state.sessions.clone(), cookie).await {
        Ok(session) => session,
        Err(err) => return AppError::from(err).into_response(),
    };

    let started = Instant::now();
    let request = prepare_request(request.into_inner(), session.clone(), &state.loaders);
    let response = state.schema.execute(request).await;

    counter!(GRAPHQL_REQUESTS_TOTAL).increment(1);
    if response.is_err() {
        counter!(GRAPHQL_ERRORS_TOTAL).increment(1);
    }
    histogram!(GRAPHQL_REQUEST_MS).record(started.elapsed().as_secs_f64() * 1000.0);

    let jar = state.cookies.apply(jar, session.cookie_directive());
    (jar, GraphQLResponse::from(response)).into_response()
}

async fn playground(State(state): State<HttpState>) -> Response {
    if !state.playground {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()).into_response()
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
