use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use tokio::{fs::File, io::AsyncReadExt};

use serde::Deserialize;

pub const DEFAULT_PATH: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error opening file {0}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("Error reading file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Error decoding file {0}: {1}")]
    Decode(PathBuf, serde_yaml::Error),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "databaseUrl")]
    pub database_url: String,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub assets: Assets,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub secure: bool,
    #[serde(rename = "inactivityDays", default = "default_inactivity_days")]
    pub inactivity_days: i64,
}

impl Default for Session {
    fn default() -> Self {
        Session { secure: false, inactivity_days: default_inactivity_days() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Assets {
    #[serde(default = "default_assets_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl Default for Assets {
    fn default() -> Self {
        Assets { dir: default_assets_dir(), entry: default_entry(), version: None }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

fn default_inactivity_days() -> i64 {
    14
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("public/assets")
}

fn default_entry() -> String {
    String::from("/assets/application.js")
}

impl Config {
    /// Minimal configuration pointing at the given database, everything else defaulted
    pub fn with_database(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            bind: default_bind(),
            session: Session::default(),
            assets: Assets::default(),
        }
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self, Error> {
        serde_yaml::from_str(contents).map_err(|e| Error::Decode(path.to_owned(), e))
    }
}

/// reads config file
pub async fn get(path: impl AsRef<Path>) -> Result<Config, Error> {
    let path = path.as_ref();
    let mut file = File::open(path).await.map_err(|e| Error::Open(path.to_owned(), e))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).await.map_err(|e| Error::Read(path.to_owned(), e))?;
    Config::parse(path, &contents)
}
