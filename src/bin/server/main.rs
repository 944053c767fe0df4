use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer};
use anyhow::Context;
use complaint_desk::app_config::{self, AppConfig};
use complaint_desk::db::Store;
use complaint_desk::session::TokenKeys;
use complaint_desk::web::AppState;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();
    let config = app_config::get_config();

    if config.database.url.is_empty() {
        anyhow::bail!("No database configured. Set DATABASE_URL or COMPLAINTS_DATABASE__URL.");
    }

    let store = Store::connect(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    if config.database.bootstrap_schema {
        store
            .ensure_schema()
            .await
            .context("Failed to create database schema")?;
    }

    let keys = TokenKeys::new(&token_secret(&config), config.auth.token_ttl_hours)
        .context("Invalid token configuration")?;
    let state = AppState::new(store.clone(), keys, &config);

    let bind = (config.server.host.clone(), config.server.port);
    log::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let state = state.clone();

        // Middleware is applied in reverse execution order.
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "no-referrer")),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(move |conf| state.register(conf))
    })
    .bind(bind)?
    .run()
    .await?;

    store.close().await.context("Failed to close the database pool")?;
    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(err) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", err);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

fn token_secret(config: &AppConfig) -> String {
    if !config.auth.jwt_secret.is_empty() {
        return config.auth.jwt_secret.clone();
    }

    let random_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    log::warn!("COMPLAINTS_AUTH__JWT_SECRET is not set. Issued tokens will stop working every time the application is restarted.");
    random_string
}
