use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use vitrine::application::listing::ListingService;
use vitrine::application::publish::PublishService;
use vitrine::application::repos::{
    AccountsRepo, AdsRepo, ProfilesRepo, PublishAdParams, PublishStore, RepoError,
};
use vitrine::application::sessions::SessionService;
use vitrine::domain::badges::{ActivePromotion, PromotionState};
use vitrine::domain::entities::{AccountRecord, AdRecord, MediaRecord, ProfileRecord};
use vitrine::domain::promotion::PromotionConfig;
use vitrine::domain::types::PromotionCategory;
use vitrine::infra::db::PostgresRepositories;
use vitrine::infra::http::api::rate_limit::ApiRateLimiter;
use vitrine::infra::http::api::state::ApiState;
use vitrine::infra::http::build_api_router;

const SESSION_TOKEN: &str = "sess-test-token";

fn sample_account(tokens_balance: i64, email_verified: bool) -> AccountRecord {
    AccountRecord {
        id: Uuid::new_v4(),
        email: Some("ad@example.test".to_string()),
        email_verified,
        tokens_balance,
        is_vip: false,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn sample_ad(profile_id: Uuid, promotion: PromotionState) -> AdRecord {
    let now = OffsetDateTime::now_utc();
    AdRecord {
        id: Uuid::new_v4(),
        profile_id,
        title: "Massage suédois".to_string(),
        body: "Description".to_string(),
        active: true,
        promotion,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct StubRepos {
    sessions: HashMap<String, (AccountRecord, Uuid)>,
    active_ads: Vec<AdRecord>,
    profiles: HashMap<Uuid, ProfileRecord>,
    published: Mutex<Vec<PublishAdParams>>,
    has_active_ad: bool,
}

#[async_trait]
impl AccountsRepo for StubRepos {
    async fn find_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<(AccountRecord, Uuid)>, RepoError> {
        Ok(self.sessions.get(token).cloned())
    }

    async fn find_by_profile(&self, profile_id: Uuid) -> Result<Option<AccountRecord>, RepoError> {
        Ok(self
            .sessions
            .values()
            .find(|(_, id)| *id == profile_id)
            .map(|(account, _)| account.clone()))
    }
}

#[async_trait]
impl ProfilesRepo for StubRepos {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        Ok(self.profiles.get(&id).cloned())
    }

    async fn list_media(&self, _profile_id: Uuid) -> Result<Vec<MediaRecord>, RepoError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl AdsRepo for StubRepos {
    async fn list_active(&self, limit: u32) -> Result<Vec<AdRecord>, RepoError> {
        Ok(self
            .active_ads
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_active_by_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<AdRecord>, RepoError> {
        Ok(self
            .active_ads
            .iter()
            .find(|ad| ad.profile_id == profile_id)
            .cloned())
    }
}

#[async_trait]
impl PublishStore for StubRepos {
    async fn publish_ad(&self, params: PublishAdParams) -> Result<AdRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let ad = AdRecord {
            id: Uuid::new_v4(),
            profile_id: params.profile_id,
            title: params.title.clone(),
            body: params.body.clone(),
            active: true,
            promotion: params.promotion.clone(),
            created_at: now,
            updated_at: now,
        };
        self.published.lock().await.push(params);
        Ok(ad)
    }

    async fn unpublish_ad(&self, _profile_id: Uuid) -> Result<(), RepoError> {
        if self.has_active_ad {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

// `db` only backs /healthz; a lazy pool keeps router tests offline.
fn lazy_repositories() -> Arc<PostgresRepositories> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://vitrine@localhost/vitrine_test")
        .expect("lazy pool should build without connecting");
    Arc::new(PostgresRepositories::new(pool))
}

struct TestApp {
    router: Router,
    repos: Arc<StubRepos>,
    profile_id: Uuid,
}

fn build_app(stub: StubRepos, promotions: PromotionConfig, rate_cap: u32) -> TestApp {
    let profile_id = stub
        .sessions
        .get(SESSION_TOKEN)
        .map(|(_, id)| *id)
        .unwrap_or_else(Uuid::new_v4);

    let repos = Arc::new(stub);
    let accounts: Arc<dyn AccountsRepo> = repos.clone();
    let ads: Arc<dyn AdsRepo> = repos.clone();
    let profiles: Arc<dyn ProfilesRepo> = repos.clone();
    let store: Arc<dyn PublishStore> = repos.clone();

    let promotions = Arc::new(promotions);
    let state = ApiState {
        sessions: SessionService::new(accounts),
        publish: Arc::new(PublishService::new(store, promotions, true)),
        listing: Arc::new(ListingService::new(ads, profiles)),
        rate_limiter: Arc::new(ApiRateLimiter::new(StdDuration::from_secs(60), rate_cap)),
        db: lazy_repositories(),
    };

    TestApp {
        router: build_api_router(state),
        repos,
        profile_id,
    }
}

fn default_app(tokens_balance: i64) -> TestApp {
    let profile_id = Uuid::new_v4();
    let mut stub = StubRepos::default();
    stub.sessions.insert(
        SESSION_TOKEN.to_string(),
        (sample_account(tokens_balance, true), profile_id),
    );
    build_app(stub, PromotionConfig::default(), 1_000)
}

fn publish_payload(profile_id: Uuid, promote: Value) -> Value {
    json!({
        "profileId": profile_id,
        "title": "Massage suédois",
        "description": "Séance relaxante",
        "tarif": "80",
        "lieu": "Genève",
        "services": ["massage"],
        "disponibilite": "7j/7",
        "promote": promote,
    })
}

fn publish_request(payload: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/annonces")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(payload.to_string()))
        .expect("request should build")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn publish_returns_priced_ad() {
    let app = default_app(20);
    let payload = publish_payload(
        app.profile_id,
        json!({
            "featured": { "optionId": 1 },
            "urgent": { "optionId": 1 },
        }),
    );

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Massage suédois");
    // publication 2 + featured 3 + urgent 2
    assert_eq!(body["quote"]["totalTokens"], 7);
    assert_eq!(body["quote"]["remainingTokens"], 13);
    assert_eq!(body["quote"]["allowed"], true);

    let published = app.repos.published.lock().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].tokens_to_deduct, 7);
    assert!(
        published[0]
            .promotion
            .get(PromotionCategory::Featured)
            .is_some()
    );
    assert!(
        published[0]
            .promotion
            .get(PromotionCategory::Urgent)
            .is_some()
    );
}

#[tokio::test]
async fn publish_requires_session_token() {
    let app = default_app(20);
    let payload = publish_payload(app.profile_id, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, None))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn publish_rejects_unknown_session_token() {
    let app = default_app(20);
    let payload = publish_payload(app.profile_id, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some("sess-someone-else")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn publish_rejects_foreign_profile() {
    let app = default_app(20);
    let payload = publish_payload(Uuid::new_v4(), json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn publish_requires_verified_email() {
    let profile_id = Uuid::new_v4();
    let mut stub = StubRepos::default();
    stub.sessions.insert(
        SESSION_TOKEN.to_string(),
        (sample_account(20, false), profile_id),
    );
    let app = build_app(stub, PromotionConfig::default(), 1_000);
    let payload = publish_payload(profile_id, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "email_unverified");
}

#[tokio::test]
async fn publish_reports_token_shortfall() {
    let app = default_app(1);
    // publication alone costs 2
    let payload = publish_payload(app.profile_id, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "insufficient_tokens");
    assert_eq!(body["error"]["details"]["required"], 2);
    assert_eq!(body["error"]["details"]["balance"], 1);

    assert!(app.repos.published.lock().await.is_empty());
}

#[tokio::test]
async fn publish_rejects_unknown_option() {
    let app = default_app(20);
    let payload = publish_payload(app.profile_id, json!({ "featured": { "optionId": 99 } }));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_selection");
}

#[tokio::test]
async fn publish_rejects_invalid_draft() {
    let app = default_app(20);
    let mut payload = publish_payload(app.profile_id, json!({}));
    payload["title"] = json!("ab");

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn publish_honors_kill_switch() {
    let profile_id = Uuid::new_v4();
    let mut stub = StubRepos::default();
    stub.sessions.insert(
        SESSION_TOKEN.to_string(),
        (sample_account(20, true), profile_id),
    );
    let mut promotions = PromotionConfig::default();
    promotions.publication.enabled = false;

    let app = build_app(stub, promotions, 1_000);
    let payload = publish_payload(profile_id, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(publish_request(&payload, Some(SESSION_TOKEN)))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "publishing_disabled");
}

#[tokio::test]
async fn unpublish_returns_no_content() {
    let profile_id = Uuid::new_v4();
    let mut stub = StubRepos::default();
    stub.sessions.insert(
        SESSION_TOKEN.to_string(),
        (sample_account(20, true), profile_id),
    );
    stub.has_active_ad = true;
    let app = build_app(stub, PromotionConfig::default(), 1_000);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/annonces")
        .header(header::AUTHORIZATION, format!("Bearer {SESSION_TOKEN}"))
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unpublish_without_active_ad_is_not_found() {
    let app = default_app(20);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/annonces")
        .header(header::AUTHORIZATION, format!("Bearer {SESSION_TOKEN}"))
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_public_and_carries_badges() {
    let profile_id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let mut promotion = PromotionState::default();
    promotion.categories.insert(
        PromotionCategory::Featured,
        ActivePromotion {
            option_id: 1,
            activated_at: now,
            expires_at: now + Duration::days(3),
            every_hours: None,
        },
    );

    let stub = StubRepos {
        active_ads: vec![sample_ad(profile_id, promotion)],
        ..Default::default()
    };
    let app = build_app(stub, PromotionConfig::default(), 1_000);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/annonces")
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ads = body.as_array().expect("listing should be an array");
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0]["promotionMeta"]["badges"], json!(["PREMIUM"]));
    assert_eq!(ads[0]["promotionMeta"]["remainingDays"], 3);
}

#[tokio::test]
async fn profile_view_includes_active_ad() {
    let profile_id = Uuid::new_v4();
    let mut stub = StubRepos::default();
    stub.profiles.insert(
        profile_id,
        ProfileRecord {
            id: profile_id,
            account_id: Uuid::new_v4(),
            display_name: "Aria".to_string(),
            is_pro: true,
            tarif: "80".to_string(),
            lieu: "Genève".to_string(),
            services: vec!["massage".to_string()],
            description: "Bienvenue".to_string(),
            disponibilite: "7j/7".to_string(),
            updated_at: OffsetDateTime::now_utc(),
        },
    );
    stub.active_ads = vec![sample_ad(profile_id, PromotionState::default())];
    let app = build_app(stub, PromotionConfig::default(), 1_000);

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/profiles/{profile_id}"))
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["displayName"], "Aria");
    assert_eq!(body["isPro"], true);
    assert_eq!(body["ad"]["profileId"], json!(profile_id));
    assert_eq!(body["ad"]["promotionMeta"]["badges"], json!([]));
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let app = default_app(20);

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/profiles/{}", Uuid::new_v4()))
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn publishing_config_exposes_price_table() {
    let app = default_app(20);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/publishing/config")
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["publication"]["enabled"], true);
    assert_eq!(body["publication"]["tokenRequired"], 2);
    assert_eq!(body["featured"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["vip"]["definition"], json!(["featured", "autorenew"]));
    assert_eq!(body["vip"]["discountTokens"], 2);
}

#[tokio::test]
async fn rate_limit_caps_repeated_requests() {
    let app = build_app(StubRepos::default(), PromotionConfig::default(), 2);

    for _ in 0..2 {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/annonces")
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let request = Request::builder()
        .method(Method::GET)
        .uri("/annonces")
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "rate_limited");
}
