use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{UserRequest, UserResponse};
use super::mapper::{to_entity, to_patch};
use super::validation::{validate_create, validate_update, FieldErrors};
use crate::{error::ServiceError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Unreadable bodies are reported like any other validation failure.
fn body_or_reject(
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<UserRequest, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| FieldErrors::single("body", e.body_text()).into())
}

/// Non-numeric ids get the same JSON error body as other bad input.
fn id_or_reject(id: Result<Path<i64>, PathRejection>) -> Result<i64, ServiceError> {
    id.map(|Path(id)| id)
        .map_err(|e| FieldErrors::single("id", e.body_text()).into())
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<UserResponse>), ServiceError> {
    let body = body_or_reject(payload)?;
    validate_create(&body)?;

    let created = state.users.create_user(to_entity(&body)).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/users/{}", created.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(created)))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserResponse>, ServiceError> {
    let id = id_or_reject(id)?;
    Ok(Json(state.users.get_user_by_id(id).await?))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    Ok(Json(state.users.get_all_users().await?))
}

#[instrument(skip(state, id, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ServiceError> {
    let id = id_or_reject(id)?;
    let body = body_or_reject(payload)?;
    validate_update(&body)?;

    Ok(Json(state.users.update_user(id, to_patch(body)).await?))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    let id = id_or_reject(id)?;
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        user_routes().with_state(AppState::fake())
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn john() -> Value {
        json!({ "name": "John Doe", "email": "john@example.com", "age": 30 })
    }

    #[tokio::test]
    async fn create_returns_201_with_body() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/users", Some(john())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "John Doe");
        assert_eq!(body["email"], "john@example.com");
        assert_eq!(body["age"], 30);
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn create_with_invalid_fields_returns_400_per_field() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/users",
            Some(json!({ "name": "", "email": "invalid-email", "age": -5 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["name"].is_string());
        assert!(body["email"].is_string());
        assert!(body["age"].is_string());
        assert!(body.get("fields").is_none());

        let (_, list) = call(&app, Method::GET, "/users", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn create_with_malformed_json_returns_400() {
        let app = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_email_returns_400_and_keeps_one_record() {
        let app = app();
        call(&app, Method::POST, "/users", Some(john())).await;
        let (status, body) = call(&app, Method::POST, "/users", Some(john())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("john@example.com"));

        let (_, list) = call(&app, Method::GET, "/users", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_and_unknown_id() {
        let app = app();
        call(&app, Method::POST, "/users", Some(john())).await;

        let (status, body) = call(&app, Method::GET, "/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "John Doe");

        let (status, _) = call(&app, Method::GET, "/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let app = app();
        let (_, created) = call(&app, Method::POST, "/users", Some(john())).await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/users/1",
            Some(json!({ "name": "John Updated" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "John Updated");
        assert_eq!(body["email"], "john@example.com");
        assert_eq!(body["age"], 30);
        assert_eq!(body["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn update_unknown_id_returns_404() {
        let app = app();
        let (status, _) = call(&app, Method::PUT, "/users/5", Some(json!({ "age": 40 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_to_taken_email_returns_400() {
        let app = app();
        call(&app, Method::POST, "/users", Some(john())).await;
        call(
            &app,
            Method::POST,
            "/users",
            Some(json!({ "name": "Jane", "email": "jane@example.com", "age": 28 })),
        )
        .await;

        let (status, _) = call(
            &app,
            Method::PUT,
            "/users/2",
            Some(json!({ "email": "john@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_with_negative_age_returns_400() {
        let app = app();
        call(&app, Method::POST, "/users", Some(john())).await;
        let (status, body) = call(&app, Method::PUT, "/users/1", Some(json!({ "age": -1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["age"].is_string());
    }

    #[tokio::test]
    async fn delete_returns_204_then_404() {
        let app = app();
        call(&app, Method::POST, "/users", Some(john())).await;

        let (status, body) = call(&app, Method::DELETE, "/users/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = call(&app, Method::GET, "/users/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::DELETE, "/users/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_numeric_id_returns_400_json() {
        let app = app();
        for method in [Method::GET, Method::DELETE] {
            let req = Request::builder()
                .method(method)
                .uri("/users/abc")
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                res.headers()[header::CONTENT_TYPE],
                "application/json"
            );
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["id"].as_str().unwrap().contains("abc"));
        }

        let (status, body) = call(&app, Method::PUT, "/users/abc", Some(json!({ "age": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["id"].is_string());
    }
}
