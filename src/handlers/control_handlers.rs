use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::auth::rate_limit::RateLimiter;
use crate::errors::AppError;
use crate::events::Event;
use crate::state::AppState;

use super::peer_ip;

#[derive(Deserialize)]
pub struct AdvanceBody {
    pub slide: u32,
}

#[derive(Deserialize)]
pub struct ReactBody {
    pub emoji: String,
}

/// POST /control/advance/{deck_id} — presenter-only slide change.
///
/// No upper bound is checked against the deck's real slide count; deck
/// storage owns that number and this service stays decoupled from it.
/// A failed bus publish is not an error: the state write already
/// succeeded, so late joiners still read the correct index.
pub async fn advance(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<AdvanceBody>,
    state: web::Data<AppState>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    let deck_id = path.into_inner();

    let ip = peer_ip(&req);
    if limiter.is_blocked(ip) {
        return Err(AppError::RateLimited);
    }

    let credential = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = state.auth.authorize(credential, &deck_id) {
        if matches!(e, AppError::Unauthorized) {
            limiter.record_failure(ip);
        }
        return Err(e);
    }
    limiter.clear(ip);

    state.store.set(&deck_id, body.slide)?;
    if let Err(e) = state.bus.publish(&deck_id, Event::slide(body.slide)) {
        log::warn!("bus publish failed for {deck_id}, state write kept: {e}");
    }

    Ok(HttpResponse::Ok().content_type("text/plain").body("ok"))
}

/// POST /react/{deck_id} — open to any viewer, never touches the store.
/// A reaction published while nobody is subscribed is simply lost.
pub async fn react(
    path: web::Path<String>,
    body: web::Json<ReactBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let deck_id = path.into_inner();

    let emoji = body.emoji.trim();
    if emoji.is_empty() {
        return Err(AppError::BadRequest("emoji is required".to_string()));
    }
    if emoji.len() > 64 {
        return Err(AppError::BadRequest("emoji too long".to_string()));
    }

    state.bus.publish(&deck_id, Event::reaction(emoji))?;

    Ok(HttpResponse::Ok().content_type("text/plain").body("ok"))
}
