//! Favorite coins and their on-disk persistence.
//!
//! The favorite set is a list of coin identifiers. It is stored as a JSON array of
//! strings under a fixed key; [`JsonFileStore`] maps that key to
//! `<dir>/favorites.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MarketError;
use crate::model::Coin;

/// Storage key of the favorite set.
pub const FAVORITES_KEY: &str = "favorites";

/// An insertion-ordered set of favorite coin identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Favorites {
    ids: Vec<String>,
}

impl Favorites {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present.
    ///
    /// Returns whether `id` is a favorite afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.ids.iter().position(|existing| existing == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id.to_string());
                true
            }
        }
    }

    /// Check if `id` is a favorite.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Favorite identifiers in the order they were added.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of favorites.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if there are no favorites.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep only the favorite coins, preserving the order of `coins`.
    pub fn filter_coins(&self, coins: Vec<Coin>) -> Vec<Coin> {
        coins
            .into_iter()
            .filter(|coin| self.contains(&coin.id))
            .collect()
    }
}

impl From<Vec<String>> for Favorites {
    fn from(ids: Vec<String>) -> Self {
        let mut favorites = Favorites::new();
        for id in ids {
            if !favorites.contains(&id) {
                favorites.ids.push(id);
            }
        }
        favorites
    }
}

impl From<Favorites> for Vec<String> {
    fn from(favorites: Favorites) -> Self {
        favorites.ids
    }
}

impl FromIterator<String> for Favorites {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

/// Persistence backend for the favorite set.
pub trait FavoritesStore {
    /// Load the stored set. A store with nothing saved yields an empty set.
    fn load(&self) -> Result<Favorites, MarketError>;

    /// Replace the stored set.
    fn save(&self, favorites: &Favorites) -> Result<(), MarketError>;
}

/// Stores the favorite set as a JSON file inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store writing to `<dir>/favorites.json`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", FAVORITES_KEY)),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStore for JsonFileStore {
    fn load(&self) -> Result<Favorites, MarketError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no favorites file found, starting empty");
            return Ok(Favorites::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(storage_error)?;
        let favorites: Favorites = serde_json::from_str(&contents).map_err(|e| {
            MarketError::Storage(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(count = favorites.len(), path = %self.path.display(), "loaded favorites");
        Ok(favorites)
    }

    fn save(&self, favorites: &Favorites) -> Result<(), MarketError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }

        let contents = serde_json::to_string(favorites)
            .map_err(|e| MarketError::Storage(e.to_string()))?;
        fs::write(&self.path, contents).map_err(storage_error)?;

        debug!(count = favorites.len(), path = %self.path.display(), "saved favorites");
        Ok(())
    }
}

fn storage_error(err: std::io::Error) -> MarketError {
    MarketError::Storage(err.to_string())
}
