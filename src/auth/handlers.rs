use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        services::CredentialStore,
    },
    error::AppError,
    state::AppState,
    validation::{from_object, validate_login, validate_signup, JsonObject},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/user", get(current_user))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(body) = payload?;
    let input = validate_signup(&from_object::<SignupRequest>(body)?)?;

    let creds = CredentialStore::from_ref(&state);
    let user = creds
        .register(&input.username, &input.email, &input.password)
        .await?;

    let token = JwtKeys::from_ref(&state).issue(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(body) = payload?;
    let input = validate_login(&from_object::<LoginRequest>(body)?)?;

    let creds = CredentialStore::from_ref(&state);
    let Some(user) = creds.find_by_email(&input.email).await? else {
        creds.verify_unknown(&input.password).await?;
        warn!(email = %input.email, "login unknown email");
        return Err(AppError::unauthenticated("Invalid email or password"));
    };

    if !creds.verify_password(&user, &input.password).await? {
        warn!(email = %input.email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthenticated("Invalid email or password"));
    }

    let token = JwtKeys::from_ref(&state).issue(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn current_user(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, HeaderValue, Request, StatusCode},
    };
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::test_utils::{dispatch, send, signup_user, TestApp};

    #[tokio::test]
    async fn signup_login_and_fetch_user() {
        let app = TestApp::new();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "username": "ann", "email": "ann@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["user"]["username"], "ann");
        assert!(body["user"].get("password_hash").is_none());

        // The issued token resolves to the new user.
        let verified = app.state.keys.verify(&token).unwrap();
        assert_eq!(verified.to_string(), user_id);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token2 = body["token"].as_str().unwrap();
        assert_eq!(app.state.keys.verify(token2).unwrap().to_string(), user_id);

        let (status, body) = send(&app, "GET", "/api/auth/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": user_id, "username": "ann", "email": "ann@x.com" })
        );
    }

    #[tokio::test]
    async fn signup_with_missing_fields_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "ann@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields");
        assert_eq!(app.users.len(), 0);
    }

    #[tokio::test]
    async fn signup_with_invalid_json_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = crate::test_utils::send_raw(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            "{not json",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn signup_with_array_body_is_bad_request() {
        let app = TestApp::new();
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!(["ann", "ann@x.com", "secret1"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.users.len(), 0);
    }

    #[tokio::test]
    async fn duplicate_signup_is_conflict() {
        let app = TestApp::new();
        signup_user(&app, "ann", "ann@x.com", "secret1").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "username": "ann2", "email": "ANN@x.com", "password": "other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User with this email already exists");
        assert_eq!(app.users.len(), 1);
    }

    #[tokio::test]
    async fn login_failures() {
        let app = TestApp::new();
        signup_user(&app, "ann", "ann@x.com", "secret1").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for body in [
            json!({ "email": "ann@x.com", "password": "wrong" }),
            json!({ "email": "bob@x.com", "password": "secret1" }),
        ] {
            let (status, body) = send(&app, "POST", "/api/auth/login", None, Some(body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn protected_route_rejects_bad_credentials() {
        let app = TestApp::new();
        let (token, user_id) = signup_user(&app, "ann", "ann@x.com", "secret1").await;

        let (status, body) = send(&app, "GET", "/api/auth/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token is missing");

        let (status, body) =
            crate::test_utils::send_with_header(&app, "GET", "/api/auth/user", &format!("Token {token}"))
                .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid authorization header");

        let (status, body) = send(&app, "GET", "/api/auth/user", Some("abc.def.ghi"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");

        let expired = app
            .state
            .keys
            .issue_at(user_id, OffsetDateTime::now_utc() - Duration::days(31))
            .unwrap();
        let (status, body) = send(&app, "GET", "/api/auth/user", Some(&expired), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token has expired");
    }

    #[tokio::test]
    async fn unreadable_authorization_header_is_invalid_not_missing() {
        let app = TestApp::new();
        let req = Request::builder()
            .uri("/api/auth/user")
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let (status, body) = dispatch(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid authorization header");
    }

    #[tokio::test]
    async fn token_for_removed_user_is_rejected() {
        let app = TestApp::new();
        let (token, user_id) = signup_user(&app, "ann", "ann@x.com", "secret1").await;
        app.users.remove(user_id);

        let (status, body) = send(&app, "GET", "/api/auth/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User not found");
    }
}
