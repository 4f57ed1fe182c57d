//! Loading provider definitions from disk and grouping them for the menus.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use super::model::{MenuGroup, Provider, ProviderError, parse_provider};

/// A definition file that could not be loaded.
#[derive(Debug)]
pub struct SkippedProvider {
    pub path: PathBuf,
    pub error: ProviderError,
}

/// Read-only set of providers, in file-name order.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<Provider>>,
    skipped: Vec<SkippedProvider>,
}

impl ProviderRegistry {
    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            providers: providers.into_iter().map(Arc::new).collect(),
            skipped: Vec::new(),
        }
    }

    /// Loads every `*.json` file in `directory`.
    ///
    /// Broken files are logged and recorded in [`ProviderRegistry::skipped`];
    /// they never prevent the remaining files from loading. A missing directory
    /// yields an empty registry.
    ///
    /// # Errors
    /// Returns an error only if the directory exists but cannot be listed.
    pub fn load_dir(directory: &Path) -> Result<Self, ProviderError> {
        if !directory.exists() {
            warn!(
                "Provider directory {} does not exist; no providers loaded",
                directory.display()
            );
            return Ok(Self::default());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        paths.sort();

        let mut registry = Self::default();
        for path in paths {
            match load_file(&path) {
                Ok(provider) => {
                    debug!(
                        "Loaded provider '{}' ({:?}) from {}",
                        provider.name,
                        provider.menu_group(),
                        path.display()
                    );
                    registry.providers.push(Arc::new(provider));
                }
                Err(error) => {
                    warn!("Skipping provider file {}: {}", path.display(), error);
                    registry.skipped.push(SkippedProvider { path, error });
                }
            }
        }

        info!(
            "Loaded {} provider(s) from {} ({} skipped)",
            registry.providers.len(),
            directory.display(),
            registry.skipped.len()
        );
        Ok(registry)
    }

    pub fn all(&self) -> &[Arc<Provider>] {
        &self.providers
    }

    pub fn skipped(&self) -> &[SkippedProvider] {
        &self.skipped
    }

    pub fn in_group(&self, group: MenuGroup) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers
            .iter()
            .filter(move |provider| provider.menu_group() == group)
    }

    pub fn uploads(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.in_group(MenuGroup::Upload)
    }

    /// GET and POST tools together, in file order.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.iter().filter(|provider| !provider.is_upload())
    }

    /// First provider with the given name.
    pub fn find(&self, name: &str) -> Option<Arc<Provider>> {
        self.providers
            .iter()
            .find(|provider| provider.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn load_file(path: &Path) -> Result<Provider, ProviderError> {
    let raw = fs::read_to_string(path)?;
    let mut provider = parse_provider(&raw)?;
    provider.source = Some(path.to_path_buf());
    Ok(provider)
}
