use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use lemon_core::remote::MenuEndpoint;

pub struct Config {
    pub db_path: PathBuf,
    pub endpoint: MenuEndpoint,
}

impl Config {
    pub fn load(menu_url: Option<String>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "lemon").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("lemon.db");
        let endpoint = endpoint_from(menu_url, |key| std::env::var(key).ok());

        Ok(Config { db_path, endpoint })
    }
}

/// Defaults, overridden by `LEMON_*` variables, overridden by the `--menu-url` flag.
fn endpoint_from(menu_url: Option<String>, env: impl Fn(&str) -> Option<String>) -> MenuEndpoint {
    let defaults = MenuEndpoint::default();
    MenuEndpoint {
        menu_url: menu_url
            .or_else(|| env("LEMON_MENU_URL"))
            .unwrap_or(defaults.menu_url),
        image_base: env("LEMON_IMAGE_BASE").unwrap_or(defaults.image_base),
        image_suffix: env("LEMON_IMAGE_SUFFIX").unwrap_or(defaults.image_suffix),
    }
}
