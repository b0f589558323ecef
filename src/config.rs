use figment::{
    providers::{Env, Format, Json, Toml, YamlExtended},
    Figment,
};
use rocket::{
    config::Ident,
    data::{ByteUnit, Limits},
    Config,
};
use serde::{Deserialize, Serialize};
use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

fn default_storage_root() -> PathBuf {
    PathBuf::from("/tmp/files_manager")
}

fn default_session_ttl_seconds() -> u64 {
    24 * 3600
}

fn default_thumbnail_worker_count() -> usize {
    1
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AppConfig {
    /// The address to bind the server to.
    pub address: Option<IpAddr>,
    /// The port to bind the server to.
    pub port: Option<u16>,
    /// The directory file content is stored under.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// How long a login session stays valid.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    /// Number of concurrent thumbnail workers.
    #[serde(default = "default_thumbnail_worker_count")]
    pub thumbnail_worker_count: usize,
    /// The limits for the application.
    pub limits: Option<AppLimit>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AppLimit {
    pub form: Option<ByteUnit>,
    pub file: Option<ByteUnit>,
    pub string: Option<ByteUnit>,
    pub bytes: Option<ByteUnit>,
    pub json: Option<ByteUnit>,
}

impl AppConfig {
    pub fn load(file_path: Option<impl AsRef<Path>>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new().join(Env::raw());

        if let Some(file_path) = file_path {
            let file_path = file_path.as_ref();

            if !file_path.exists() {
                return Err(
                    format!("The given path `{}` is not exist.", file_path.display()).into(),
                );
            }

            match file_path.extension() {
                Some(ext) if ext.eq_ignore_ascii_case("json") => {
                    figment = figment.join(Json::file(file_path));
                }
                Some(ext)
                    if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") =>
                {
                    figment = figment.join(YamlExtended::file(file_path));
                }
                _ => {
                    figment = figment.join(Toml::file(file_path));
                }
            }
        }

        figment.extract()
    }

    pub fn make_rocket_config(&self) -> Config {
        let mut config = Config::default();

        if let Some(address) = self.address {
            config.address = address;
        }

        if let Some(port) = self.port {
            config.port = port;
        }

        let mut limits = Limits::default();

        if let Some(app_limits) = &self.limits {
            if let Some(form) = app_limits.form {
                limits = limits.limit("form", form);
            }
            if let Some(file) = app_limits.file {
                limits = limits.limit("file", file);
            }
            if let Some(string) = app_limits.string {
                limits = limits.limit("string", string);
            }
            if let Some(bytes) = app_limits.bytes {
                limits = limits.limit("bytes", bytes);
            }
            if let Some(json) = app_limits.json {
                limits = limits.limit("json", json);
            }
        }

        config.limits = limits;
        config.ident = Ident::none();
        config.keep_alive = 60;

        config
    }
}
