use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::ServiceError;
use crate::models::cart::CartState;

/// Where the cart lives between processes. Implementations must tolerate
/// concurrent writers from other views: the contract is last-writer-wins,
/// not transactional merge.
pub trait CartPersistence: Send + Sync {
    fn load(&self) -> Result<Option<CartState>, ServiceError>;
    fn save(&self, state: &CartState) -> Result<(), ServiceError>;
}

/// JSON file under the profile directory, keyed by
/// [`crate::config::CART_STORAGE_KEY`]. Any same-profile view reads and
/// writes the same file.
#[derive(Debug)]
pub struct JsonFileCartStore {
    path: PathBuf,
}

impl JsonFileCartStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CartPersistence for JsonFileCartStore {
    fn load(&self) -> Result<Option<CartState>, ServiceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, state: &CartState) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory adapter for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    state: Mutex<Option<CartState>>,
}

impl CartPersistence for InMemoryCartStore {
    fn load(&self) -> Result<Option<CartState>, ServiceError> {
        Ok(self
            .state
            .lock()
            .map_err(|_| ServiceError::Storage("cart store poisoned".to_string()))?
            .clone())
    }

    fn save(&self, state: &CartState) -> Result<(), ServiceError> {
        *self
            .state
            .lock()
            .map_err(|_| ServiceError::Storage("cart store poisoned".to_string()))? =
            Some(state.clone());
        Ok(())
    }
}
