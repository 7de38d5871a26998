//! JSON REST API for Lado.
//!
//! Exposes an axum [`Router`] backed by an [`AccessEngine`] over any
//! [`PlatformStore`]. Authentication happens upstream; the authenticated user
//! id arrives in the [`viewer::VIEWER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lado_api::api_router(engine.clone()))
//! ```

pub mod access;
pub mod compliance;
pub mod error;
pub mod moderation;
pub mod subscriptions;
pub mod viewer;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use lado_core::{AccessEngine, config::PolicyConfig, store::PlatformStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub policy:     PolicyConfig,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<AccessEngine<S>>) -> Router<()>
where
  S: PlatformStore + 'static,
{
  Router::new()
    // Visibility
    .route("/content/{id}/visibility", get(access::visibility::<S>))
    .route("/profiles/{handle}", get(access::profile::<S>))
    // Age compliance
    .route("/jurisdictions/{country}", get(compliance::minimum_age::<S>))
    .route(
      "/age-verification",
      get(compliance::history::<S>).post(compliance::verify::<S>),
    )
    // Subscriptions
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route("/subscriptions/{id}/cancel", post(subscriptions::cancel::<S>))
    .route(
      "/subscriptions/{id}/auto-renew",
      put(subscriptions::auto_renew::<S>),
    )
    // Moderation
    .route("/moderation/censor", post(moderation::censor::<S>))
    .route("/moderation/uncensor", post(moderation::uncensor::<S>))
    .route("/moderation/delete", post(moderation::delete::<S>))
    .route("/moderation/log", get(moderation::log::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(engine)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
  };
  use chrono::{TimeZone, Utc};
  use lado_core::{
    clock::FixedClock,
    content::{NewContent, Surface},
    user::{NewUser, User},
    visibility::{Decision, HiddenReason},
  };
  use lado_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::viewer::VIEWER_HEADER;

  type Engine = Arc<AccessEngine<SqliteStore>>;

  async fn make_engine() -> Engine {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    Arc::new(
      AccessEngine::new(store, Arc::new(clock), PolicyConfig::default()).unwrap(),
    )
  }

  async fn add_user(engine: &Engine, input: NewUser) -> User {
    let now = engine.now();
    engine.store().add_user(input, now).await.unwrap()
  }

  async fn add_restricted(engine: &Engine, owner: Uuid) -> Uuid {
    let now = engine.now();
    engine
      .store()
      .add_content(NewContent::new(owner, "b/1.jpg", Surface::Restricted), now)
      .await
      .unwrap()
      .content_id
  }

  async fn send(
    engine: &Engine,
    method: Method,
    uri:    &str,
    viewer: Option<Uuid>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = viewer {
      builder = builder.header(VIEWER_HEADER, id.to_string());
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(engine.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn decision(engine: &Engine, item: Uuid, viewer: Option<Uuid>) -> Decision {
    let resp = send(
      engine,
      Method::GET,
      &format!("/content/{item}/visibility"),
      viewer,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(json_body(resp).await).unwrap()
  }

  // ── Visibility ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn restricted_content_across_viewer_states() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;
    let creator = add_user(&engine, NewUser::creator("creator", true)).await;
    let item = add_restricted(&engine, creator.user_id).await;

    assert_eq!(
      decision(&engine, item, None).await,
      Decision::Hidden(HiddenReason::RequiresAuth)
    );
    assert_eq!(
      decision(&engine, item, Some(fan.user_id)).await,
      Decision::Hidden(HiddenReason::RequiresSubscription)
    );

    let resp = send(
      &engine,
      Method::POST,
      "/subscriptions",
      Some(fan.user_id),
      Some(json!({ "creator_id": creator.user_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(decision(&engine, item, Some(fan.user_id)).await, Decision::Visible);
  }

  #[tokio::test]
  async fn unknown_content_is_hidden_not_found() {
    let engine = make_engine().await;
    let resp = send(
      &engine,
      Method::GET,
      &format!("/content/{}/visibility", Uuid::new_v4()),
      None,
      None,
    )
    .await;
    assert_eq!(
      json_body(resp).await,
      json!({ "decision": "hidden", "reason": "not_found" })
    );
  }

  #[tokio::test]
  async fn malformed_viewer_header_is_rejected() {
    let engine = make_engine().await;
    let req = Request::builder()
      .uri(format!("/content/{}/visibility", Uuid::new_v4()))
      .header(VIEWER_HEADER, "not-a-uuid")
      .body(Body::empty())
      .unwrap();
    let resp = api_router(engine).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Profiles ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn gated_creator_profile_is_public_for_everyone() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;
    let creator = add_user(&engine, NewUser::creator("Sol", true)).await;
    add_restricted(&engine, creator.user_id).await;

    for viewer in [None, Some(fan.user_id)] {
      let resp = send(&engine, Method::GET, "/profiles/sol", viewer, None).await;
      assert_eq!(resp.status(), StatusCode::OK);
      let body = json_body(resp).await;
      assert_eq!(body["destination"], "public_profile");
      assert_eq!(body["profile"]["has_restricted_surface"], true);
    }
  }

  #[tokio::test]
  async fn unknown_profile_is_404() {
    let engine = make_engine().await;
    let resp = send(&engine, Method::GET, "/profiles/nadie", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(json_body(resp).await["error"].is_string());
  }

  // ── Age verification ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn underage_verification_is_forbidden() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;

    let resp = send(
      &engine,
      Method::POST,
      "/age-verification",
      Some(fan.user_id),
      Some(json!({ "birth_date": "2006-06-02", "country": "CL" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      &engine,
      Method::POST,
      "/age-verification",
      Some(fan.user_id),
      Some(json!({ "birth_date": "2006-06-01", "country": "cl" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let entry = json_body(resp).await;
    assert_eq!(entry["age_at_verification"], 18);
    assert_eq!(entry["country"], "CL");

    let resp = send(&engine, Method::GET, "/age-verification", Some(fan.user_id), None)
      .await;
    assert_eq!(json_body(resp).await.as_array().map(Vec::len), Some(1));
  }

  #[tokio::test]
  async fn invalid_country_is_unprocessable() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;
    let resp = send(
      &engine,
      Method::POST,
      "/age-verification",
      Some(fan.user_id),
      Some(json!({ "birth_date": "1990-01-01", "country": "Chile" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn jurisdiction_lookup() {
    let engine = make_engine().await;
    let resp = send(&engine, Method::GET, "/jurisdictions/kr", None, None).await;
    assert_eq!(
      json_body(resp).await,
      json!({ "country": "KR", "minimum_age": 19 })
    );

    let resp =
      send(&engine, Method::GET, "/jurisdictions/%20br%20", None, None).await;
    assert_eq!(
      json_body(resp).await,
      json!({ "country": "BR", "minimum_age": 18 })
    );
  }

  #[tokio::test]
  async fn malformed_jurisdiction_is_unprocessable() {
    let engine = make_engine().await;
    for code in ["Chile", "c1", "CHL"] {
      let resp = send(
        &engine,
        Method::GET,
        &format!("/jurisdictions/{code}"),
        None,
        None,
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{code}");
    }
  }

  // ── Subscriptions ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn subscription_lifecycle_over_http() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;
    let creator = add_user(&engine, NewUser::creator("creator", true)).await;
    let body = json!({ "creator_id": creator.user_id });

    let resp =
      send(&engine, Method::POST, "/subscriptions", Some(fan.user_id), Some(body.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sub_id = json_body(resp).await["subscription_id"]
      .as_str()
      .unwrap()
      .to_owned();

    let resp =
      send(&engine, Method::POST, "/subscriptions", Some(fan.user_id), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(
      &engine,
      Method::PUT,
      &format!("/subscriptions/{sub_id}/auto-renew"),
      Some(fan.user_id),
      Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(json_body(resp).await["auto_renew"], false);

    let resp = send(
      &engine,
      Method::POST,
      &format!("/subscriptions/{sub_id}/cancel"),
      Some(creator.user_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
      &engine,
      Method::POST,
      &format!("/subscriptions/{sub_id}/cancel"),
      Some(fan.user_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["is_active"], false);

    let resp = send(&engine, Method::GET, "/subscriptions", Some(fan.user_id), None).await;
    assert_eq!(json_body(resp).await, json!([]));
  }

  #[tokio::test]
  async fn subscriptions_require_a_viewer() {
    let engine = make_engine().await;
    let resp = send(&engine, Method::GET, "/subscriptions", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Moderation ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn censor_then_audit_log() {
    let engine = make_engine().await;
    let admin = add_user(&engine, NewUser::moderator("mod")).await.user_id;
    let creator = add_user(&engine, NewUser::creator("creator", true)).await;
    let item = add_restricted(&engine, creator.user_id).await;
    let ghost = Uuid::new_v4();

    let resp = send(
      &engine,
      Method::POST,
      "/moderation/censor",
      Some(admin),
      Some(json!({ "content_ids": [item, ghost] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome = json_body(resp).await;
    assert_eq!(outcome["affected"], 1);
    assert_eq!(outcome["not_found"], json!([ghost]));

    assert_eq!(
      decision(&engine, item, Some(creator.user_id)).await,
      Decision::Hidden(HiddenReason::Censored)
    );

    let resp = send(&engine, Method::GET, "/moderation/log?limit=5", Some(admin), None).await;
    let log = json_body(resp).await;
    assert_eq!(log[0]["action"], "censor");
    assert_eq!(log[0]["reason"], "Inappropriate content");
    assert_eq!(log[0]["content_ids"], json!([item]));
  }

  #[tokio::test]
  async fn empty_selection_is_bad_request() {
    let engine = make_engine().await;
    let admin = add_user(&engine, NewUser::moderator("mod")).await.user_id;
    let resp = send(
      &engine,
      Method::POST,
      "/moderation/uncensor",
      Some(admin),
      Some(json!({ "content_ids": [] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn delete_requires_confirmation() {
    let engine = make_engine().await;
    let admin = add_user(&engine, NewUser::moderator("mod")).await.user_id;
    let creator = add_user(&engine, NewUser::creator("creator", true)).await;
    let item = add_restricted(&engine, creator.user_id).await;

    let resp = send(
      &engine,
      Method::POST,
      "/moderation/delete",
      Some(admin),
      Some(json!({ "content_ids": [item] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(engine.store().get_content(item).await.unwrap().is_some());

    let resp = send(
      &engine,
      Method::POST,
      "/moderation/delete",
      Some(admin),
      Some(json!({ "content_ids": [item], "confirm": true })),
    )
    .await;
    assert_eq!(json_body(resp).await["affected"], 1);
    assert!(engine.store().get_content(item).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn moderation_is_forbidden_without_the_capability() {
    let engine = make_engine().await;
    let fan = add_user(&engine, NewUser::fan("fan")).await;
    let creator = add_user(&engine, NewUser::creator("creator", true)).await;
    let item = add_restricted(&engine, creator.user_id).await;

    for (path, body) in [
      ("/moderation/censor", json!({ "content_ids": [item] })),
      ("/moderation/uncensor", json!({ "content_ids": [item] })),
      ("/moderation/delete", json!({ "content_ids": [item], "confirm": true })),
    ] {
      let resp =
        send(&engine, Method::POST, path, Some(fan.user_id), Some(body)).await;
      assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path}");
    }
    let resp =
      send(&engine, Method::GET, "/moderation/log", Some(fan.user_id), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let snapshot = engine.store().get_content(item).await.unwrap().unwrap();
    assert!(!snapshot.content.is_censored);
  }
}
