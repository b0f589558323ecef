mod config;
mod dto;
mod fairings;
mod guards;
mod logger;
mod routes;
mod services;
mod stores;


use crate::{
    config::AppConfig,
    fairings::thumbnail_worker::ThumbnailWorker,
    services::{local_file_system::LocalFileSystem, InMemoryThumbnailQueue, ThumbnailQueue},
    stores::{
        memory::{InMemoryDocumentStore, InMemorySessionStore},
        DocumentStore, SessionStore,
    },
};
use chrono::Duration;
use clap::{Arg, ArgAction, Command, ValueHint};
use const_format::formatcp;
use dto::ErrorBody;
use rocket::{catch, catchers, http::Status, serde::json::Json, Build, Request, Rocket};
use std::{path::Path, sync::Arc};
use thiserror::Error;

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(formatcp!(
            "{} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("COMMIT_HASH"),
            env!("COMMIT_DATE")
        ))
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("config")
                .help("Path to the config file")
                .short('c')
                .long("config")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .required(false)
                .allow_hyphen_values(true)
                .num_args(1),
        )
        .subcommand(
            Command::new("generate-config")
                .about("Generate a new config file")
                .long_about("Generate a new config file with the default values.")
                .arg(
                    Arg::new("config")
                        .help("Path to the config file")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .value_hint(ValueHint::FilePath)
                        .required(true)
                        .allow_hyphen_values(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("overwrite")
                        .help("Overwrite the file if it already exists")
                        .long("overwrite")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("test-config")
                .about("Print the config")
                .long_about("Print the config from the given file. This is useful for testing the config file.")
                .arg(
                    Arg::new("config")
                        .help("Path to the config file")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .value_hint(ValueHint::FilePath)
                        .required(false)
                        .allow_hyphen_values(true)
                        .num_args(1),
                ),
        )
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    RocketError(#[from] rocket::Error),
    #[error("{0}")]
    FigmentError(#[from] figment::Error),
}

#[rocket::main]
async fn main() {
    let cli_matches = cli().get_matches();

    let result = match cli_matches.subcommand() {
        Some(("generate-config", sub_matches)) => {
            let config_path = sub_matches.get_one::<String>("config").unwrap();
            let overwrite = sub_matches.get_flag("overwrite");
            generate_config(config_path, overwrite)
        }
        Some(("test-config", sub_matches)) => {
            let config_path = sub_matches.get_one::<String>("config");
            test_config(config_path)
        }
        _ => {
            let config_path = cli_matches.get_one::<String>("config");
            run_server(config_path).await
        }
    };

    // Humanize the message if it's an error.
    if let Err(err) = result {
        let mut err = err.to_string();

        if let Some(first) = err.chars().next() {
            if first.is_ascii_lowercase() {
                err = first.to_uppercase().to_string() + &err[1..];
            }
        }

        if let Some(last) = err.chars().last() {
            match last {
                '.' | '!' | '?' => {}
                _ => err.push('.'),
            }
        }

        eprintln!("Command failed.");
        eprintln!("{}", err);
    }
}

fn generate_config(config_path: impl AsRef<Path>, overwrite: bool) -> Result<(), AppError> {
    let config_path = config_path.as_ref();

    if config_path.exists() {
        if !overwrite {
            eprintln!("The file already exists. Use the `--overwrite` flag to overwrite it.");
            eprintln!("Configuration is not generated.");
            return Ok(());
        }

        println!("The file already exists. Overwriting it.");
    }

    const JSON_CONFIG: &str = include_str!("./config/default.json");
    const TOML_CONFIG: &str = include_str!("./config/default.toml");
    const YAML_CONFIG: &str = include_str!("./config/default.yaml");

    let (file_type, file_content) = match config_path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ("JSON", JSON_CONFIG),
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
            ("YAML", YAML_CONFIG)
        }
        _ => ("TOML", TOML_CONFIG),
    };

    std::fs::write(config_path, file_content)?;

    let full_config_path = config_path.canonicalize()?;
    println!(
        "{} configuration has been generated at `{}`.",
        file_type,
        full_config_path.display()
    );

    Ok(())
}

fn test_config(config_path: Option<impl AsRef<Path> + Clone>) -> Result<(), AppError> {
    let app_config = AppConfig::load(config_path.clone())?;
    let rocket_config = app_config.make_rocket_config();

    if let Some(config_path) = &config_path {
        let config_path = config_path.as_ref().canonicalize()?;
        println!(
            "Configuration path has been set: `{}`",
            config_path.display()
        );
    }

    println!("Configuration has been loaded successfully.");

    println!("[Loaded Configuration]");
    println!("- address: {}", rocket_config.address);
    println!("- port: {}", rocket_config.port);
    println!("- storage_root: {}", app_config.storage_root.display());
    println!("- session_ttl_seconds: {}", app_config.session_ttl_seconds);
    println!(
        "- thumbnail_worker_count: {}",
        app_config.thumbnail_worker_count
    );

    println!("- limits:");
    println!("    - form: {}", rocket_config.limits.get("form").unwrap());
    println!("    - file: {}", rocket_config.limits.get("file").unwrap());
    println!(
        "    - string: {}",
        rocket_config.limits.get("string").unwrap()
    );
    println!(
        "    - bytes: {}",
        rocket_config.limits.get("bytes").unwrap()
    );
    println!("    - json: {}", rocket_config.limits.get("json").unwrap());

    Ok(())
}

async fn run_server(config_path: Option<impl AsRef<Path> + Clone>) -> Result<(), AppError> {
    logger::setup_logger();

    let app_config = AppConfig::load(config_path.clone())?;
    let rocket = create_rocket_instance(&app_config)?;

    if let Some(config_path) = &config_path {
        let config_path = config_path.as_ref().canonicalize()?;
        let config_path = config_path.display().to_string();
        log::info!(target: "init", config_path; "Configuration path has been set.");
    }

    log::info!(target: "init", app_config:serde; "Configuration has been loaded.");

    let rocket = setup_rocket_instance(app_config, rocket, true).await?;
    let _rocket = rocket.launch().await?;

    Ok(())
}

/// Creates a new Rocket instance from the given configuration.
pub fn create_rocket_instance(app_config: &AppConfig) -> Result<Rocket<Build>, AppError> {
    let rocket_config = app_config.make_rocket_config();
    let rocket = Rocket::custom(rocket_config);
    Ok(rocket)
}

/// Sets up the Rocket instance with the given configuration.
/// This function opens the blob storage root and wires the stores, the
/// services and the routes. The thumbnail workers are only attached when
/// `attach_fairings` is set; tests drive the queue by hand instead.
pub async fn setup_rocket_instance(
    app_config: AppConfig,
    rocket: Rocket<Build>,
    attach_fairings: bool,
) -> Result<Rocket<Build>, AppError> {
    let storage_root = &app_config.storage_root;

    log::info!(target: "file_driver", storage_root:?; "Opening blob storage.");
    let file_driver = LocalFileSystem::new(storage_root).await?;

    let session_store: Arc<dyn SessionStore + Send + Sync> = Arc::new(InMemorySessionStore::new());
    let document_store: Arc<dyn DocumentStore + Send + Sync> =
        Arc::new(InMemoryDocumentStore::new());
    let thumbnail_queue: Arc<dyn ThumbnailQueue + Send + Sync> =
        Arc::new(InMemoryThumbnailQueue::new());
    let session_ttl = Duration::seconds(app_config.session_ttl_seconds as i64);

    let rocket = rocket.register("/", catchers![default_catcher]);
    let rocket = services::register_services(
        rocket,
        session_store,
        document_store,
        Arc::new(file_driver),
        thumbnail_queue,
        session_ttl,
    );
    let rocket = routes::register_routes(rocket);

    let rocket = if attach_fairings {
        rocket.attach(ThumbnailWorker::new(app_config.thumbnail_worker_count))
    } else {
        rocket
    };

    let rocket = rocket.manage(app_config);

    Ok(rocket)
}

#[catch(default)]
fn default_catcher(status: Status, _request: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: dto::ErrorBodyKind::Dynamic(status.reason_lossy().to_string()),
    })
}
