use std::convert::Infallible;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::errors::AppError;
use crate::gateway;
use crate::state::AppState;

/// GET /live/{deck_id} — persistent SSE stream for one viewer.
pub async fn stream(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let deck_id = path.into_inner();
    let rx = gateway::open(&state.store, &state.bus, &deck_id, state.heartbeat)?;
    let body = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache, no-transform"))
        .insert_header((header::CONNECTION, "keep-alive"))
        .streaming(body))
}

/// HEAD /live/{deck_id} — existence probe without opening a stream.
pub async fn probe(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.store.get(&path.into_inner())? {
        Some(_) => Ok(HttpResponse::Ok().finish()),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}
