use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::auth::rate_limit::RateLimiter;
use crate::errors::AppError;
use crate::state::AppState;

use super::peer_ip;

#[derive(Deserialize)]
pub struct LoginBody {
    pub password: String,
    pub deck: String,
}

/// POST /login — exchange the presenter password for a token scoped to
/// one deck, valid 30 days. Rate-limited per client IP.
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginBody>,
    state: web::Data<AppState>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    let ip = peer_ip(&req);
    if limiter.is_blocked(ip) {
        return Err(AppError::RateLimited);
    }

    let deck = body.deck.trim();
    if deck.is_empty() {
        return Err(AppError::BadRequest("deck is required".to_string()));
    }

    if !state.auth.verify_presenter_password(&body.password) {
        limiter.record_failure(ip);
        return Err(AppError::Unauthorized);
    }
    limiter.clear(ip);

    let token = state.auth.issue_token(deck)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}
