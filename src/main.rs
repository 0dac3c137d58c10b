use std::path::Path;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};

use lume_live::auth::Authenticator;
use lume_live::auth::rate_limit::RateLimiter;
use lume_live::bus;
use lume_live::config::Config;
use lume_live::db;
use lume_live::routes;
use lume_live::state::AppState;
use lume_live::store::{SqliteStateStore, StateStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let pool = db::init_pool(&config.db_path);
    db::run_migrations(&pool);

    let store: Arc<dyn StateStore> = Arc::new(SqliteStateStore::new(pool.clone()));
    let event_bus = bus::build_bus(
        config.bus,
        store.clone(),
        config.poll_floor,
        config.poll_ceil,
    );
    let auth = Authenticator::new(
        pool,
        config.shared_secret.clone(),
        config.presenter_password_hash.clone(),
        config.presenter_password.clone(),
    );

    let state = web::Data::new(AppState {
        store,
        bus: event_bus,
        auth,
        heartbeat: config.heartbeat,
    });
    let limiter = web::Data::new(RateLimiter::new());

    log::info!("Starting live sync server at http://{}", config.bind);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
            .app_data(state.clone())
            .app_data(limiter.clone())
            .configure(routes::configure)
    })
    .bind(&config.bind)?
    .run()
    .await
}
