// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::sync::{Arc, PoisonError, RwLock};

/// Current model of a recognizer that may be retrained while it serves.
///
/// Readers take a snapshot with [`SharedModel::current`] and keep using it;
/// a retrained model is swapped in whole with [`SharedModel::replace`], so a
/// reader never sees a half-updated model.
#[derive(Debug)]
pub struct SharedModel<M> {
    current: RwLock<Arc<M>>,
}

impl<M> SharedModel<M> {
    pub fn new(model: M) -> Self {
        SharedModel {
            current: RwLock::new(Arc::new(model)),
        }
    }

    pub fn current(&self) -> Arc<M> {
        // the guarded value is a single Arc, it cannot be left half-written
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `model` and return the one it replaces.
    pub fn replace(&self, model: M) -> Arc<M> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(model))
    }
}
