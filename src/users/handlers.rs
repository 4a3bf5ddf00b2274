use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{ListQuery, SecureData, UserPage, UserPayload};
use crate::users::repo::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/secure-data", get(secure_data))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserPage>, ApiError> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);
    let offset = (page - 1).saturating_mul(page_size);
    let filter = query.skillset.as_deref().filter(|s| !s.is_empty());

    info!(page, page_size, "fetching users");

    let (total_count, data) = state.store.list(filter, page_size, offset).await?;
    if data.is_empty() {
        warn!("no users found");
    }

    let total_pages = (total_count + page_size - 1) / page_size;
    Ok(Json(UserPage {
        total_count,
        page,
        page_size,
        total_pages,
        data,
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    match state.store.get(id).await? {
        Some(user) => {
            info!(id, "user found");
            Ok(Json(user))
        }
        None => {
            warn!(id, "user not found");
            Err(ApiError::NotFound("User not found".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> Result<(StatusCode, HeaderMap, Json<User>), ApiError> {
    let draft = payload.into_draft()?;
    info!(username = %draft.username, "creating user");

    let user = state.store.create(&draft).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::LOCATION,
        format!("/api/users/{}", user.id).parse().unwrap(),
    );

    info!(id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, headers, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserPayload>,
) -> Result<StatusCode, ApiError> {
    let draft = payload.into_draft()?;
    if !state.store.update(id, &draft).await? {
        warn!(id, "user not found");
        return Err(ApiError::NotFound("User not found".into()));
    }
    info!(id, "user updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete(id).await? {
        warn!(id, "user not found");
        return Err(ApiError::NotFound("User not found".into()));
    }
    info!(id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn secure_data(AuthUser(username): AuthUser) -> Json<SecureData> {
    info!(%username, "secure data accessed");
    Json(SecureData {
        message: "This is a protected API endpoint!".into(),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRef;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::auth::jwt::JwtKeys;
    use crate::state::AppState;

    fn test_app() -> (AppState, Router) {
        let state = AppState::fake();
        let app = build_app(state.clone());
        (state, app)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn user_json(username: &str, skillsets: &str) -> Value {
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "phone": "555-0100",
            "skillsets": skillsets,
            "hobby": "chess",
        })
    }

    async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn seed_user(app: &Router, username: &str, skillsets: &str) -> Value {
        let response = send_json(app, "POST", "/api/users", user_json(username, skillsets)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn list_on_empty_store_returns_envelope_not_error() {
        let (_state, app) = test_app();
        let response = get(&app, "/api/users").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["totalCount"], 0);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 10);
        assert_eq!(body["totalPages"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_bounds() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust").await;

        let body = json_body(get(&app, "/api/users?pageSize=1000").await).await;
        assert_eq!(body["pageSize"], 100);
        assert_eq!(body["totalPages"], 1);

        let body = json_body(get(&app, "/api/users?pageSize=0&page=0").await).await;
        assert_eq!(body["pageSize"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["data"][0]["username"], "john_doe");
    }

    #[tokio::test]
    async fn second_page_returns_second_created_user() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust").await;
        seed_user(&app, "jane_smith", "sql").await;

        let body = json_body(get(&app, "/api/users?pageSize=1&page=2").await).await;
        assert_eq!(body["totalCount"], 2);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["username"], "jane_smith");
    }

    #[tokio::test]
    async fn skillset_filter_applies_before_counting() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust,sql").await;
        seed_user(&app, "jane_smith", "go,js").await;

        let body = json_body(get(&app, "/api/users?skillset=rust").await).await;
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["data"][0]["username"], "john_doe");

        let response = get(&app, "/api/users?skillset=cobol").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["totalCount"], 0);
        assert_eq!(body["totalPages"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn get_missing_user_returns_404_envelope() {
        let (_state, app) = test_app();
        let response = get(&app, "/api/users/42").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["StatusCode"], 404);
        assert_eq!(body["Message"], "User not found");
    }

    #[tokio::test]
    async fn create_assigns_server_side_id_and_location() {
        let (_state, app) = test_app();
        let mut payload = user_json("john_doe", "rust");
        payload["id"] = json!(999);

        let response = send_json(&app, "POST", "/api/users", payload).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/users/1"
        );
        let body = json_body(response).await;
        assert_eq!(body["id"], 1);

        let body = json_body(get(&app, "/api/users/1").await).await;
        assert_eq!(body["username"], "john_doe");
    }

    #[tokio::test]
    async fn create_rejects_blank_payload() {
        let (_state, app) = test_app();
        let response = send_json(&app, "POST", "/api/users", json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["Message"], "Invalid user data");

        let mut payload = user_json("john_doe", "rust");
        payload["username"] = json!("");
        let response = send_json(&app, "POST", "/api/users", payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_all_fields_and_keeps_id() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust").await;

        let response = send_json(&app, "PUT", "/api/users/1", user_json("john_updated", "go")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());

        let body = json_body(get(&app, "/api/users/1").await).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["username"], "john_updated");
        assert_eq!(body["skillsets"], "go");
    }

    #[tokio::test]
    async fn update_missing_user_returns_404_without_mutation() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust").await;

        let response = send_json(&app, "PUT", "/api/users/99", user_json("ghost", "cobol")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["Message"], "User not found");

        let body = json_body(get(&app, "/api/users").await).await;
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["data"][0]["username"], "john_doe");
    }

    #[tokio::test]
    async fn delete_twice_returns_204_then_404() {
        let (_state, app) = test_app();
        seed_user(&app, "john_doe", "rust").await;

        let response = send_json(&app, "DELETE", "/api/users/1", json!({})).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send_json(&app, "DELETE", "/api/users/1", json!({})).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["StatusCode"], 404);
        assert_eq!(body["Message"], "User not found");
    }

    #[tokio::test]
    async fn secure_data_requires_valid_token() {
        let (state, app) = test_app();

        let response = get(&app, "/api/users/secure-data").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/users/secure-data")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["StatusCode"], 401);

        let token = JwtKeys::from_ref(&state).sign("admin").unwrap();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/users/secure-data")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "This is a protected API endpoint!");
    }
}
