//! Tilda order webhook handler.
//!
//! The signature is verified over the raw body before any parsing, so the
//! handler takes headers plus bytes rather than an extractor. Duplicate
//! deliveries for an already-stored external order id are answered with
//! the same success body and write nothing.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::post,
};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, instrument, warn};

use tilda_bridge_core::phone;

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::AppError;
use crate::ingest::{self, WebhookOrder};
use crate::services::Notifier;
use crate::state::AppState;

/// Create webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhook/tilda", post(handle_tilda_webhook))
}

/// Response body returned to Tilda.
#[derive(Debug, Serialize)]
struct WebhookResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deep_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl WebhookResponse {
    fn created(order_id: String, deep_link: Option<String>) -> Self {
        Self {
            status: "ok",
            order_id: Some(order_id),
            deep_link,
            message: None,
        }
    }

    fn duplicate(order_id: String) -> Self {
        Self {
            status: "ok",
            order_id: Some(order_id),
            deep_link: None,
            message: Some("already processed"),
        }
    }
}

/// Handle an inbound order webhook.
#[instrument(skip(state, headers, body))]
async fn handle_tilda_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    verify_signature(&state, &headers, &body)?;

    let payload = parse_body(&headers, &body).await?;

    let repo = OrderRepository::new(state.pool());

    // Idempotency: replays of an already-stored order are a benign success.
    if repo.get_by_external_id(&payload.external_id).await?.is_some() {
        warn!(order_id = %payload.external_id, "duplicate webhook delivery");
        return Ok(Json(WebhookResponse::duplicate(payload.external_id)));
    }

    let mut order = match repo.create_from_webhook(&payload).await {
        Ok(order) => order,
        // Lost the race against a concurrent delivery of the same id.
        Err(RepositoryError::Conflict(_)) => {
            warn!(order_id = %payload.external_id, "duplicate webhook delivery (insert race)");
            return Ok(Json(WebhookResponse::duplicate(payload.external_id)));
        }
        Err(e) => return Err(e.into()),
    };

    // Returning customers are matched by normalized phone and linked right
    // away, so status notifications reach them before the deep link is
    // opened.
    if !payload.phone.is_empty()
        && let Some(user) = UserRepository::new(state.pool())
            .get_by_phone(&phone::normalize(&payload.phone))
            .await?
    {
        order = repo.attach_user(order.id, user.chat_id).await?;
        info!(order_id = %order.external_order_id, user_id = %user.chat_id, "matched returning customer by phone");
    }

    let deep_link = state
        .config()
        .telegram()
        .map(|telegram| telegram.deep_link(&order.external_order_id));

    info!(
        order_id = %order.external_order_id,
        items = order.items.len(),
        items_total = %order.items_total(),
        "order ingested"
    );

    // Notify the operator off the request path; a chat outage must not
    // delay or fail the webhook response.
    let notify_state = state.clone();
    let notify_order = order.clone();
    tokio::spawn(async move {
        Notifier::new(&notify_state)
            .operator_new_order(&notify_order)
            .await;
    });

    Ok(Json(WebhookResponse::created(
        order.external_order_id,
        deep_link,
    )))
}

/// Verify the `X-Tilda-Signature` header: hex HMAC-SHA256 over the raw
/// body. Skipped when no signing secret is configured.
fn verify_signature(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let Some(secret) = state.config().tilda_signing_secret.as_ref() else {
        return Ok(());
    };

    let signature = headers
        .get("X-Tilda-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Forbidden("missing webhook signature".to_string()))?;

    let provided = hex::decode(signature)
        .map_err(|_| AppError::Forbidden("malformed webhook signature".to_string()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(body);

    // Constant-time comparison.
    mac.verify_slice(&provided).map_err(|_| {
        warn!("invalid webhook signature");
        AppError::Forbidden("invalid webhook signature".to_string())
    })
}

/// Parse the body into the canonical order record, dispatching on the
/// content type: JSON, urlencoded, or multipart.
async fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<WebhookOrder, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))?;
        return Ok(ingest::from_json(&value)?);
    }

    let fields = if let Ok(boundary) = multer::parse_boundary(content_type) {
        multipart_fields(body.clone(), boundary).await?
    } else {
        url::form_urlencoded::parse(body)
            .into_owned()
            .collect::<BTreeMap<_, _>>()
    };

    Ok(ingest::from_fields(&fields)?)
}

/// Collect multipart text fields from the already-buffered body.
async fn multipart_fields(
    body: Bytes,
    boundary: String,
) -> Result<BTreeMap<String, String>, AppError> {
    let stream = futures::stream::once(async move { Ok::<Bytes, std::convert::Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart field: {e}")))?;
        fields.insert(name, text);
    }

    Ok(fields)
}
