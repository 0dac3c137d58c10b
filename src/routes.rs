use actix_web::web;

use crate::handlers;

/// Route table, shared by the server binary and endpoint tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(handlers::auth_handlers::login))
        .route(
            "/control/advance/{deck_id}",
            web::post().to(handlers::control_handlers::advance),
        )
        .route(
            "/react/{deck_id}",
            web::post().to(handlers::control_handlers::react),
        )
        .service(
            web::resource("/live/{deck_id}")
                .route(web::get().to(handlers::live_handlers::stream))
                .route(web::head().to(handlers::live_handlers::probe)),
        );
}
