pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let organization_routes = Router::new()
        .route("/", get(routes::organization::list))
        .route("/", post(routes::organization::create))
        .route("/{org_id}", get(routes::organization::get))
        .route("/{org_id}", put(routes::organization::update))
        .route("/{org_id}", delete(routes::organization::delete));

    // Member routes (under organization)
    let member_routes = Router::new()
        .route("/", get(routes::member::list))
        .route("/leave", post(routes::member::leave))
        .route("/{user_id}", put(routes::member::update_role))
        .route("/{user_id}", delete(routes::member::remove));

    // Invitation management (under organization)
    let organization_invitation_routes = Router::new()
        .route("/", get(routes::invitation::list))
        .route("/", post(routes::invitation::create))
        .route("/{invitation_id}", delete(routes::invitation::cancel));

    // Public lookup by token; accepting requires auth
    let public_invitation_routes = Router::new()
        .route("/{token}", get(routes::invitation::details))
        .route("/{token}/accept", post(routes::invitation::accept));

    let project_routes = Router::new()
        .route("/", get(routes::project::list))
        .route("/", post(routes::project::create))
        .route("/{project_id}", get(routes::project::get))
        .route("/{project_id}", put(routes::project::update))
        .route("/{project_id}", delete(routes::project::delete))
        .route("/{project_id}/member", post(routes::project::add_member))
        .route(
            "/{project_id}/member/{user_id}",
            delete(routes::project::remove_member),
        );

    // Task routes (under project)
    let project_task_routes = Router::new()
        .route("/", get(routes::task::list))
        .route("/", post(routes::task::create))
        .route("/generate", post(routes::task::generate));

    let task_routes = Router::new()
        .route("/{task_id}", get(routes::task::get))
        .route("/{task_id}", put(routes::task::update))
        .route("/{task_id}", delete(routes::task::delete))
        .route("/{task_id}/comment", get(routes::task::list_comments))
        .route("/{task_id}/comment", post(routes::task::create_comment));

    // Sprint routes (under project)
    let sprint_routes = Router::new()
        .route("/", get(routes::sprint::list))
        .route("/", post(routes::sprint::create))
        .route("/{sprint_id}", delete(routes::sprint::delete));

    let document_routes = Router::new()
        .route("/", get(routes::document::list))
        .route("/", post(routes::document::create))
        .route("/{document_id}", get(routes::document::get))
        .route("/{document_id}", put(routes::document::update))
        .route("/{document_id}", delete(routes::document::delete));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/organization", organization_routes)
        .nest("/organization/{org_id}/member", member_routes)
        .nest("/organization/{org_id}/invitation", organization_invitation_routes)
        .nest("/invitation", public_invitation_routes)
        .nest("/project", project_routes)
        .nest("/project/{project_id}/task", project_task_routes)
        .nest("/project/{project_id}/sprint", sprint_routes)
        .nest("/task", task_routes)
        .nest("/document", document_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
