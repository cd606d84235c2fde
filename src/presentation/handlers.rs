// HTTP request handlers
use crate::application::dashboard_service::DashboardService;
use crate::domain::period::PeriodFilter;
use crate::domain::role::{Role, UserIdentity};
use crate::domain::tile_link::ProjectListQuery;
use crate::infrastructure::cache::CacheKey;
use crate::infrastructure::chunked_json::framed_stream_response;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use crate::presentation::identity::CurrentUser;
use crate::presentation::query::{parse_query_pairs, period_cache_key};
use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Response},
    response::IntoResponse,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

type ApiResult = Result<Response<Body>, ApiError>;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Resolve the requested dashboard role and check the caller may open it
fn authorize(identity: &UserIdentity, requested: &str) -> Result<Role, ApiError> {
    let role = requested
        .parse::<Role>()
        .map_err(|_| ApiError::UnknownRole(requested.to_string()))?;

    if !identity.role.can_view(role) {
        return Err(ApiError::Forbidden {
            viewer: identity.role.to_string(),
            requested: role.to_string(),
        });
    }

    Ok(role)
}

async fn respond<T: Serialize>(data: &T, headers: &HeaderMap) -> ApiResult {
    json_response(data, accepts_brotli(headers))
        .await
        .map_err(|status| ApiError::Internal(anyhow::anyhow!("Failed to encode response ({})", status)))
}

/// Serve `{ <field>: rows }` through the response cache
async fn cached_rows<T, F, Fut>(
    state: &AppState,
    headers: &HeaderMap,
    identity: &UserIdentity,
    endpoint: &str,
    field: &'static str,
    period: PeriodFilter,
    load: F,
) -> ApiResult
where
    T: Serialize,
    F: FnOnce(DashboardService, PeriodFilter) -> Fut,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    let key = CacheKey::new(endpoint, identity.scope(), period_cache_key(&period));
    let service = state.dashboard_service.clone();

    let body = state
        .cache
        .get_or_load(key, move || {
            let rows = load(service, period);
            async move {
                let mut body = serde_json::Map::new();
                body.insert(field.to_string(), serde_json::to_value(rows.await?)?);
                Ok::<_, anyhow::Error>(serde_json::Value::Object(body))
            }
        })
        .await?;

    respond(&body, headers).await
}

/// Whole dashboard for a role, every widget evaluated before responding
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(role): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let role = authorize(&identity, &role)?;
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));

    tracing::debug!(
        "Dashboard {} for user {} ({})",
        role,
        identity.id,
        identity.name.as_deref().unwrap_or("unnamed")
    );

    let dashboard = state
        .dashboard_service
        .get_dashboard(role, identity.scope(), &period)
        .await;
    respond(&dashboard, &headers).await
}

/// Stream dashboard for a role (progressive loading)
pub async fn stream_dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    Path(role): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let role = authorize(&identity, &role)?;
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));

    let rx = state
        .streaming_service
        .stream_dashboard(role, identity.scope(), period)
        .await;
    Ok(framed_stream_response(rx, accepts_brotli(&headers)))
}

pub async fn revenue_by_lead_source(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "revenue-by-lead-source",
        "rows",
        period,
        move |service, period| async move { service.revenue_by_lead_source(scope, &period).await },
    )
    .await
}

pub async fn word_cloud(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "wordcloud",
        "words",
        period,
        move |service, period| async move { service.word_cloud(scope, &period).await },
    )
    .await
}

pub async fn pipeline_by_stage(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "pipeline-by-stage",
        "stages",
        period,
        move |service, period| async move { service.pipeline_by_stage(scope, &period).await },
    )
    .await
}

pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "payment-status",
        "buckets",
        period,
        move |service, period| async move { service.payment_status(scope, &period).await },
    )
    .await
}

pub async fn year_over_year(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "year-over-year",
        "years",
        period,
        move |service, period| async move { service.year_over_year(scope, &period).await },
    )
    .await
}

pub async fn loan_by_bank(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "loan-by-bank",
        "banks",
        period,
        move |service, period| async move { service.loan_by_bank(scope, &period).await },
    )
    .await
}

/// Tiles of the caller's own role, each with its drill-down link
pub async fn quick_access(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let role = identity.role;
    let scope = identity.scope();
    let endpoint = format!("quick-access/{}", role);
    cached_rows(
        &state,
        &headers,
        &identity,
        &endpoint,
        "tiles",
        period,
        move |service, period| async move { service.quick_access(role, scope, &period).await },
    )
    .await
}

pub async fn sales_team_performance(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let period = PeriodFilter::from_query(&parse_query_pairs(query.as_deref()));
    let scope = identity.scope();
    cached_rows(
        &state,
        &headers,
        &identity,
        "sales-team-performance",
        "salespeople",
        period,
        move |service, period| async move { service.sales_team_performance(scope, &period).await },
    )
    .await
}

#[derive(Serialize)]
struct ProjectList<'a> {
    count: usize,
    projects: &'a [crate::domain::project::Project],
}

/// Drill-down target of every tile link; not cached
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult {
    let list_query = ProjectListQuery::from_pairs(&parse_query_pairs(query.as_deref()));
    let projects = state
        .dashboard_service
        .list_projects(identity.scope(), &list_query)
        .await?;

    respond(
        &ProjectList {
            count: projects.len(),
            projects: &projects,
        },
        &headers,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregation::fixtures::snapshot;
    use crate::application::streaming_service::StreamingDashboardService;
    use crate::infrastructure::cache::QueryCache;
    use crate::infrastructure::memory_repository::MemoryRepository;
    use axum::http::StatusCode;
    use std::time::Duration;

    fn state() -> Arc<AppState> {
        let dashboard_service =
            DashboardService::new(Arc::new(MemoryRepository::with_projects(snapshot())), 10);
        Arc::new(AppState {
            streaming_service: StreamingDashboardService::new(dashboard_service.clone(), 16),
            dashboard_service,
            cache: Arc::new(QueryCache::new(Duration::from_secs(30), Duration::from_secs(60), 64)),
        })
    }

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser(UserIdentity { id, role, name: None })
    }

    fn query(raw: &str) -> RawQuery {
        RawQuery(Some(raw.to_string()))
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_authorize() {
        let sales = UserIdentity { id: 10, role: Role::Sales, name: None };
        let admin = UserIdentity { id: 1, role: Role::Admin, name: None };

        assert_eq!(authorize(&sales, "sales").unwrap(), Role::Sales);
        assert!(matches!(authorize(&sales, "FINANCE"), Err(ApiError::Forbidden { .. })));
        assert!(matches!(authorize(&sales, "janitor"), Err(ApiError::UnknownRole(_))));
        assert_eq!(authorize(&admin, "FINANCE").unwrap(), Role::Finance);
    }

    #[tokio::test]
    async fn test_dashboard_rejects_other_roles() {
        let result = get_dashboard(
            State(state()),
            user(10, Role::Sales),
            Path("OPERATIONS".to_string()),
            RawQuery(None),
            HeaderMap::new(),
        )
        .await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dashboard_json_shape() {
        let response = get_dashboard(
            State(state()),
            user(1, Role::Finance),
            Path("finance".to_string()),
            query("fy=2024-25"),
            HeaderMap::new(),
        )
        .await
        .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["role"], "FINANCE");
        assert_eq!(json["period"]["financialYears"][0], "2024-25");
        assert_eq!(json["widgets"].as_array().unwrap().len(), Role::Finance.widgets().len());
    }

    #[tokio::test]
    async fn test_tile_href_lists_same_count() {
        let state = state();
        let response = quick_access(
            State(state.clone()),
            user(10, Role::Sales),
            query("fy=2024-25"),
            HeaderMap::new(),
        )
        .await
        .unwrap();
        let json = body_json(response).await;

        for tile in json["tiles"].as_array().unwrap() {
            let href = tile["link"]["href"].as_str().unwrap();
            let raw = href.split_once('?').map(|(_, q)| q.to_string());

            let listed = list_projects(
                State(state.clone()),
                user(10, Role::Sales),
                RawQuery(raw),
                HeaderMap::new(),
            )
            .await
            .unwrap();
            let listed = body_json(listed).await;

            assert_eq!(listed["count"], tile["count"], "{}", href);
        }
    }

    #[tokio::test]
    async fn test_aggregate_wraps_rows() {
        let response = pipeline_by_stage(
            State(state()),
            user(1, Role::Management),
            RawQuery(None),
            HeaderMap::new(),
        )
        .await
        .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["stages"].as_array().unwrap().len(), 8);
    }
}
