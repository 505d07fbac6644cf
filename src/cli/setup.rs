use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");
const SAMPLE_CATALOG: &str = include_str!("../../docs/sample_products.json");
const CATALOG_LINE: &str = "catalog_path: \"products.json\"";

/// Rewrites the example's relative catalog path to `catalog`.
fn render_config(catalog: &Path) -> String {
    EXAMPLE_CONFIG.replacen(
        CATALOG_LINE,
        &format!("catalog_path: {:?}", catalog.display().to_string()),
        1,
    )
}

/// Creates a default configuration file and sample catalog at the default location
pub fn setup() -> Result<()> {
    setup_at_path(AppConfig::default_config_path()?)
}

/// Creates a configuration file at `path` with a sample catalog beside it.
/// An existing catalog is left untouched.
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let catalog: PathBuf = dir.join("products.json");
    if !catalog.exists() {
        std::fs::write(&catalog, SAMPLE_CATALOG)
            .with_context(|| format!("Failed to write sample catalog to {}", catalog.display()))?;
        tracing::info!("Created sample catalog at {}", catalog.display());
    }

    std::fs::write(path, render_config(&catalog))
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
