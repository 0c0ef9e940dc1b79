use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState, static_dir: &Path) -> Router {
    let dashboard_assets = Router::new()
        .fallback_service(
            ServeDir::new(static_dir)
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let app = Router::new()
        .route("/proxy", get(routes::proxy::get_predictions_map))
        .route("/api/proxy", get(routes::proxy::get_predictions_map))
        .route(
            "/api/predictions",
            get(routes::proxy::get_prediction_report),
        )
        .route("/api/divisions", get(routes::api::get_divisions))
        .route("/api/divisions/locate", get(routes::api::locate))
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics));

    app.layer(CompressionLayer::new())
        .layer(cors)
        .fallback_service(dashboard_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

/// Next.js export layout: `/_next/static/` is content-addressed, division
/// polygons only change with a redeploy.
fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if path.starts_with("/_next/static/") {
        Some("public, max-age=31536000, immutable")
    } else if path.starts_with("/map_polygons/") && path.ends_with(".json") {
        Some("public, max-age=86400")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_static_chunks_are_immutable() {
        assert_eq!(
            cache_control_for_path("/_next/static/chunks/app/page-9e3b51c2d7a04f18.js"),
            Some("public, max-age=31536000, immutable")
        );
        assert_eq!(
            cache_control_for_path("/_next/static/css/5d41402abc4b2a76.css"),
            Some("public, max-age=31536000, immutable")
        );
    }

    #[test]
    fn division_polygons_cache_for_a_day() {
        assert_eq!(
            cache_control_for_path("/map_polygons/Dhaka.json"),
            Some("public, max-age=86400")
        );
        assert_eq!(cache_control_for_path("/map_polygons/"), None);
    }

    #[test]
    fn pages_and_api_paths_keep_default_caching() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
        assert_eq!(cache_control_for_path("/_next/data/build/index.json"), None);
        assert_eq!(cache_control_for_path("/api/proxy"), None);
    }
}
