use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

use crate::services::thumbnail::{DEFAULT_THUMBNAIL_HEIGHT, DEFAULT_THUMBNAIL_WIDTH, ThumbnailSize};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub public_url: String,
    pub max_upload_bytes: usize,
    pub thumbnail: ThumbnailSize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Asset upload service with thumbnail generation")]
pub struct Args {
    /// Host to bind to (overrides ASSET_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ASSET_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where assets are stored (overrides ASSET_STORE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Public base URL for stored objects (overrides ASSET_STORE_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Largest accepted upload body in bytes (overrides ASSET_STORE_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Thumbnail bounding box width (overrides ASSET_STORE_THUMBNAIL_WIDTH)
    #[arg(long)]
    pub thumbnail_width: Option<u32>,

    /// Thumbnail bounding box height (overrides ASSET_STORE_THUMBNAIL_HEIGHT)
    #[arg(long)]
    pub thumbnail_height: Option<u32>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse(), |key| env::var(key))
    }

    /// Merge parsed CLI args over values looked up through `lookup`.
    pub fn from_args<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup("ASSET_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "ASSET_STORE_PORT", 3000u16)?;
        let env_storage =
            lookup("ASSET_STORE_STORAGE_DIR").unwrap_or_else(|_| "./data/assets".into());
        let env_max_upload =
            parse_var(&lookup, "ASSET_STORE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let env_thumb_width =
            parse_var(&lookup, "ASSET_STORE_THUMBNAIL_WIDTH", DEFAULT_THUMBNAIL_WIDTH)?;
        let env_thumb_height =
            parse_var(&lookup, "ASSET_STORE_THUMBNAIL_HEIGHT", DEFAULT_THUMBNAIL_HEIGHT)?;

        // --- Merge ---
        let port = args.port.unwrap_or(env_port);
        let public_url = match args.public_url {
            Some(url) => url,
            None => lookup("ASSET_STORE_PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}/objects", port)),
        };
        let thumbnail = ThumbnailSize {
            width: args.thumbnail_width.unwrap_or(env_thumb_width),
            height: args.thumbnail_height.unwrap_or(env_thumb_height),
        };
        if thumbnail.width == 0 || thumbnail.height == 0 {
            anyhow::bail!(
                "thumbnail bounds must be non-zero, got {}x{}",
                thumbnail.width,
                thumbnail.height
            );
        }

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            public_url,
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            thumbnail,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
