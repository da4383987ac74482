//! Named model handles, loaded lazily and shared.
//!
//! A model is created the first time it is requested and reused after that.
//! The loader runs while the registry lock is held, so concurrent requests
//! for the same name never load it twice. A failed load leaves no entry and
//! the next request retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

use crate::error::{PerturbError, Result};

/// Registry of shared model handles keyed by name.
#[derive(Debug)]
pub struct ModelRegistry<T> {
    models: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ModelRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<T>>> {
        self.models.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the model called `name`, running `loader` if it is not loaded.
    ///
    /// # Errors
    /// `ModelLoad` wrapping the loader's error message.
    pub fn get_or_load<F>(&self, name: &str, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut models = self.lock();
        if let Some(model) = models.get(name) {
            return Ok(Arc::clone(model));
        }

        info!("loading model '{name}'");
        let model = loader().map_err(|err| PerturbError::ModelLoad {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        let model = Arc::new(model);
        models.insert(name.to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Already-loaded model, if any.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Loaded model names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every handle held by the registry. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
