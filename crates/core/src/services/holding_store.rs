use log::{info, warn};
use std::path::PathBuf;

use crate::errors::CoreError;
use crate::models::asset::AssetCatalog;
use crate::models::holding::{is_valid_amount, Holding};
use crate::storage::manager::StorageManager;

/// Owns the user's holdings and keeps the holdings file in step with them.
///
/// Every mutation validates first and touches nothing on failure. After a
/// successful in-memory change the list is saved; if that save fails the
/// change is kept (memory is authoritative) and the persistence error is
/// returned so the caller can warn the user.
pub struct HoldingStore {
    holdings: Vec<Holding>,
    storage: StorageManager,
    catalog: AssetCatalog,
}

impl HoldingStore {
    /// Open the store, loading whatever the holdings file contains.
    pub fn open(path: impl Into<PathBuf>, catalog: AssetCatalog) -> Self {
        let storage = StorageManager::new(path);
        let holdings = storage.load();
        for holding in &holdings {
            if !catalog.contains(&holding.id) {
                warn!("Loaded holding for unknown asset {}; it will stay unpriced", holding.id);
            }
        }
        Self {
            holdings,
            storage,
            catalog,
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Re-read the holdings file, replacing the in-memory list.
    pub fn load(&mut self) -> &[Holding] {
        self.holdings = self.storage.load();
        &self.holdings
    }

    /// Persist the current list.
    pub fn save(&self) -> Result<(), CoreError> {
        self.storage.save(&self.holdings)
    }

    /// Append a new holding.
    pub fn add(&mut self, id: &str, amount: f64) -> Result<(), CoreError> {
        if !self.catalog.contains(id) {
            return Err(CoreError::ValidationError(format!("Unknown asset id: {id}")));
        }
        validate_amount(amount)?;

        self.holdings.push(Holding::new(id, amount));
        info!("Added holding {id} ({amount})");
        self.save()
    }

    /// Replace the amount of the holding at `index`.
    pub fn update(&mut self, index: usize, new_amount: f64) -> Result<(), CoreError> {
        validate_amount(new_amount)?;
        let len = self.holdings.len();
        let holding = self
            .holdings
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })?;

        holding.amount = new_amount;
        info!("Updated holding #{index} ({}) to {new_amount}", holding.id);
        self.save()
    }

    /// Remove the holding at `index`. Out-of-range indexes are an error, not a no-op.
    pub fn remove(&mut self, index: usize) -> Result<Holding, CoreError> {
        let len = self.holdings.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }

        let removed = self.holdings.remove(index);
        info!("Removed holding #{index} ({})", removed.id);
        self.save()?;
        Ok(removed)
    }
}

fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !is_valid_amount(amount) {
        return Err(CoreError::ValidationError(format!(
            "Amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}
