use std::env;
use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use log::{info, initialize_logger};
use storyvault::config::get_variable;
use storyvault::db::{DefaultOwner, PgDb};
use storyvault::environment::{Config, Environment};
use storyvault::routes;
use storyvault::store::S3Store;
use storyvault::upload::MAX_UPLOAD_BYTES;
use storyvault::urls::Urls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let store = Arc::new(S3Store::from_env().expect("initialize S3 store from environment"));

    let main_port: u16 = get_variable("STORYVAULT_PORT")
        .parse()
        .expect("parse STORYVAULT_PORT as u16");
    let admin_port: u16 = get_variable("STORYVAULT_ADMIN_PORT")
        .parse()
        .expect("parse STORYVAULT_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("STORYVAULT_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from STORYVAULT_DB_CONNECTION_STRING");

    let owner = DefaultOwner {
        email: env::var("STORYVAULT_DEFAULT_OWNER_EMAIL")
            .unwrap_or_else(|_| "default@storyvault.local".to_owned()),
        name: env::var("STORYVAULT_DEFAULT_OWNER_NAME")
            .unwrap_or_else(|_| "Default User".to_owned()),
    };
    let db = Arc::new(PgDb::new(pool, owner));

    let urls = Arc::new(Urls::new(
        get_variable("STORYVAULT_BASE_URL"),
        get_variable("STORYVAULT_STORIES_PATH"),
    ));

    let max_upload_bytes = match env::var("STORYVAULT_MAX_UPLOAD_BYTES") {
        Ok(value) => value
            .parse()
            .expect("parse STORYVAULT_MAX_UPLOAD_BYTES as u64"),
        Err(_) => MAX_UPLOAD_BYTES,
    };
    let config = Config::new(max_upload_bytes);

    let environment = Environment::new(logger.clone(), db, urls, store, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            termination_sender.send(()).await.unwrap();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate();
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let create_route = routes::make_create_route(environment.clone());
        let list_route = routes::make_list_route(environment.clone());
        let retrieve_route = routes::make_retrieve_route(environment.clone());
        let update_route = routes::make_update_route(environment.clone());
        let delete_route = routes::make_delete_route(environment.clone());
        let upload_route = routes::make_upload_route(environment.clone());
        let families_route = routes::make_families_route(environment.clone());
        let lessons_route = routes::make_lessons_route(environment.clone());

        let routes = create_route
            .or(list_route)
            .or(retrieve_route)
            .or(update_route)
            .or(delete_route)
            .or(upload_route)
            .or(families_route)
            .or(lessons_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
