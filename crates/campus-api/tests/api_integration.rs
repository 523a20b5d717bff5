//! API 통합 테스트.
//!
//! 메모리 협력자로 전체 라우터를 구성하고 `oneshot`으로 요청을 보냅니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use campus_api::middleware::{RateLimitConfig, RateLimitState};
use campus_api::routes::create_api_router;
use campus_api::AppState;
use campus_core::config::AuthConfig;
use campus_core::Profile;
use campus_session::{InMemoryAuthProvider, InMemoryProfileStore, NewAccount};
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "lesson-plan-42";

struct TestApp {
    router: Router,
    auth: Arc<InMemoryAuthProvider>,
    profiles: Arc<InMemoryProfileStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_rate_limit(None)
    }

    fn with_rate_limit(rate_limit: Option<RateLimitState>) -> Self {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let state = Arc::new(AppState::new(
            auth.clone(),
            profiles.clone(),
            AuthConfig::default(),
        ));
        Self {
            router: create_api_router(rate_limit).with_state(state),
            auth,
            profiles,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, location, body)
    }

    async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let (status, _, body) = self
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn patch(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("PATCH")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    /// 가입 후 Access Token과 uid 반환.
    async fn sign_up(&self, email: &str) -> (String, String) {
        let body = self.sign_up_body(email).await;
        let token = body["tokens"]["access_token"].as_str().unwrap().to_string();
        let uid = body["session"]["user"]["uid"].as_str().unwrap().to_string();
        (token, uid)
    }

    async fn sign_up_body(&self, email: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/auth/sign-up",
                json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    /// `Location`을 따라가며 방문한 경로 목록 반환. 303이 아니면 멈춥니다.
    async fn follow(&self, uri: &str, token: &str) -> (StatusCode, Vec<String>) {
        let mut hops = Vec::new();
        let mut next = uri.to_string();
        for _ in 0..8 {
            let (status, location, _) = self.get(&next, Some(token)).await;
            match location {
                Some(location) if status == StatusCode::SEE_OTHER => {
                    hops.push(location.clone());
                    next = location;
                }
                _ => return (status, hops),
            }
        }
        panic!("redirect chain did not settle: {hops:?}");
    }

    /// 역할 프로필이 있는 계정을 직접 등록하고 로그인 토큰 반환.
    async fn seed_user(&self, email: &str, role: &str) -> String {
        let identity = self
            .auth
            .register(NewAccount::new(email, PASSWORD))
            .await
            .unwrap();
        let profile = Profile::new(identity.uid.clone(), identity.email.clone()).with_role(role);
        campus_session::ProfileStore::create(self.profiles.as_ref(), profile)
            .await
            .unwrap();

        let (status, body) = self
            .post(
                "/api/v1/auth/sign-in",
                json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["tokens"]["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_sign_up_creates_student_session() {
    let app = TestApp::new();
    let (token, _) = app.sign_up("mina@school.test").await;

    let (status, _, body) = app.get("/api/v1/auth/session", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["role"], "student");
    assert_eq!(body["dashboard"], "/dashboard/student");
    assert!(body["features"]
        .as_array()
        .unwrap()
        .contains(&json!("take-quiz")));
}

#[tokio::test]
async fn test_sign_in_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.sign_up("mina@school.test").await;

    let (status, body) = app
        .post(
            "/api/v1/auth/sign-in",
            json!({ "email": "mina@school.test", "password": "wrong-password-1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_object() || body["code"].is_string());
}

#[tokio::test]
async fn test_sign_out_revokes_token() {
    let app = TestApp::new();
    let (token, _) = app.sign_up("mina@school.test").await;

    let (status, _) = app.post("/api/v1/auth/sign-out", json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = app.get("/api/v1/auth/session", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_sign_out_ends_refresh_session() {
    let app = TestApp::new();
    let body = app.sign_up_body("mina@school.test").await;
    let access = body["tokens"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();

    // 로그아웃 전 재발급으로 받은 토큰도 같은 세션에 묶임
    let (status, rotated) = app
        .post("/api/v1/auth/refresh", json!({ "refresh_token": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{rotated}");
    let rotated_access = rotated["tokens"]["access_token"].as_str().unwrap().to_string();
    let rotated_refresh = rotated["tokens"]["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = app.post("/api/v1/auth/sign-out", json!({}), Some(&access)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .post(
            "/api/v1/auth/refresh",
            json!({ "refresh_token": rotated_refresh }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_REVOKED");

    let (status, _, _) = app.get("/api/v1/auth/session", Some(&rotated_access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = TestApp::new();
    let body = app.sign_up_body("mina@school.test").await;
    let refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();
    let request = json!({ "refresh_token": refresh });

    let (first, second) = tokio::join!(
        app.post("/api/v1/auth/refresh", request.clone(), None),
        app.post("/api/v1/auth/refresh", request.clone(), None),
    );
    let statuses = [first.0, second.0];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "{statuses:?}"
    );
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));

    let (status, _) = app.post("/api/v1/auth/refresh", request, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_requires_token() {
    let app = TestApp::new();
    let (status, _, _) = app.get("/api/v1/auth/session", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_role_change_applies_on_next_request() {
    let app = TestApp::new();
    let admin = app.seed_user("principal@school.test", "admin").await;
    let (student_token, uid) = app.sign_up("lee@school.test").await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/profiles/{uid}"),
            json!({ "role": "Teacher" }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "teacher");

    let (_, _, body) = app.get("/api/v1/auth/session", Some(&student_token)).await;
    assert_eq!(body["session"]["role"], "teacher");
    assert_eq!(body["dashboard"], "/dashboard/teacher");
}

#[tokio::test]
async fn test_profile_patch_requires_manage_users() {
    let app = TestApp::new();
    let (token, uid) = app.sign_up("lee@school.test").await;

    let (status, _) = app
        .patch(
            &format!("/api/v1/profiles/{uid}"),
            json!({ "role": "admin" }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_patch_rejects_unknown_role() {
    let app = TestApp::new();
    let admin = app.seed_user("principal@school.test", "admin").await;
    let (_, uid) = app.sign_up("lee@school.test").await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/profiles/{uid}"),
            json!({ "role": "janitor" }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_ROLE");
}

#[tokio::test]
async fn test_dashboard_root_redirects() {
    let app = TestApp::new();

    let (status, location, _) = app.get("/dashboard", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login"));

    let teacher = app.seed_user("kim@school.test", "teacher").await;
    let (status, location, _) = app.get("/dashboard", Some(&teacher)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/dashboard/teacher"));

    let worker = app.seed_user("park@school.test", "social_worker").await;
    let (_, location, _) = app.get("/dashboard", Some(&worker)).await;
    assert_eq!(location.as_deref(), Some("/app/dashboard/counselor"));

    let (status, hops) = app.follow("/dashboard", &teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hops, vec!["/app/dashboard/teacher"]);
}

#[tokio::test]
async fn test_guarded_page_by_role() {
    let app = TestApp::new();
    let (student, _) = app.sign_up("mina@school.test").await;
    let teacher = app.seed_user("kim@school.test", "teacher").await;

    let (status, location, _) = app.get("/app/quizzes/new", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login"));

    // 기본 대체 경로(대시보드 루트)는 서버에서 역할 대시보드까지 따라감
    let (status, location, _) = app.get("/app/quizzes/new", Some(&student)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/dashboard/student"));

    let (status, location, _) = app
        .get("/app/quizzes/new?fallback=/courses", Some(&student))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/courses"));

    // 알 수 없는 대체 경로는 무시
    let (_, location, _) = app
        .get("/app/quizzes/new?fallback=/nowhere", Some(&student))
        .await;
    assert_eq!(location.as_deref(), Some("/app/dashboard/student"));

    // 자기 자신을 대체 경로로 지정하면 순환으로 끊김
    let (_, location, _) = app
        .get("/app/quizzes/new?fallback=/quizzes/new", Some(&student))
        .await;
    assert_eq!(location.as_deref(), Some("/unauthorized"));

    let (status, _, body) = app.get("/app/quizzes/new", Some(&teacher)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feature"], "create-quiz");
    assert_eq!(body["sidebar"][0]["id"], "base");
    assert_eq!(body["sidebar"][1]["id"], "teaching");
}

#[tokio::test]
async fn test_unrecognized_role_settles_on_unauthorized() {
    let app = TestApp::new();
    let legacy = app.seed_user("legacy@school.test", "district").await;

    let (status, hops) = app.follow("/dashboard", &legacy).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(hops, vec!["/unauthorized"]);

    let (status, hops) = app.follow("/app/dashboard/student", &legacy).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(hops, vec!["/unauthorized"]);

    let (status, hops) = app.follow("/app/courses", &legacy).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(hops, vec!["/unauthorized"]);
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let app = TestApp::new();
    let (token, _) = app.sign_up("mina@school.test").await;
    let (status, _, body) = app.get("/app/nowhere", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PAGE_NOT_FOUND");
}

#[tokio::test]
async fn test_unauthorized_page_is_never_guarded() {
    let app = TestApp::new();
    let (status, _, body) = app.get("/unauthorized", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["path"], "/unauthorized");
}

#[tokio::test]
async fn test_access_evaluation() {
    let app = TestApp::new();
    let (student, _) = app.sign_up("mina@school.test").await;

    let (status, _, body) = app
        .get("/api/v1/access?feature=take-quiz", Some(&student))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let (_, _, body) = app
        .get("/api/v1/access?feature=create-quiz", Some(&student))
        .await;
    assert_eq!(body["allowed"], false);

    let (_, _, body) = app
        .get("/api/v1/access?feature=no-such-feature", Some(&student))
        .await;
    assert_eq!(body["allowed"], false);

    let (status, _, body) = app
        .get("/api/v1/access?feature=create-quiz&role=teacher", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let (status, _, _) = app.get("/api/v1/access?feature=create-quiz", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roles_and_navigation() {
    let app = TestApp::new();
    let (_, _, body) = app.get("/api/v1/roles", None).await;
    assert_eq!(body["total"], 6);

    let parent = app.seed_user("jung@school.test", "parent").await;
    let (status, _, body) = app.get("/api/v1/navigation", Some(&parent)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"], "/dashboard/parent");
    let ids: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["base", "family"]);
    assert_eq!(body["messageable_roles"].as_array().unwrap().len(), 6);

    let legacy = app.seed_user("legacy@school.test", "district").await;
    let (_, _, body) = app.get("/api/v1/navigation", Some(&legacy)).await;
    assert_eq!(body["messageable_roles"], json!([]));
}

#[tokio::test]
async fn test_credential_routes_are_rate_limited() {
    let app = TestApp::with_rate_limit(Some(RateLimitState::new(RateLimitConfig::strict(60))));
    let request = json!({ "email": "mina@school.test", "password": "wrong-password-1" });

    let (first, _) = app.post("/api/v1/auth/sign-in", request.clone(), None).await;
    assert_eq!(first, StatusCode::UNAUTHORIZED);

    let (second, body) = app.post("/api/v1/auth/sign-in", request, None).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");

    // 세션 경로는 요청 제한 대상이 아님
    let (status, _, _) = app.get("/api/v1/roles", None).await;
    assert_eq!(status, StatusCode::OK);
}
