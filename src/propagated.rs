//! Data that propagates hierarchically during encoding and decoding.
use crate::std::vec::Vec;

use crate::error::RegistryError;
use crate::types::TypeId;

/// Type id collection to prevent cycling.
///
/// Type ids are collected for as long as the input is not advanced, i.e. no
/// data is consumed while decoding, or the same value is being passed
/// further while encoding. Encountering the same id twice in such chain means
/// the metadata types are cycling and the process would never end.
#[derive(Clone, Debug, Default)]
pub struct Checker {
    /// Collection of type `id`s from metadata types registry encountered so
    /// far.
    pub cycle_check: Vec<TypeId>,
}

impl Checker {
    /// Initiate new `Checker` in decoding or encoding sequence.
    pub fn new() -> Self {
        Self {
            cycle_check: Vec::new(),
        }
    }

    /// Use known, propagated from above `Checker` to construct a new `Checker`
    /// for type `id`.
    pub fn update_for_id(&self, id: TypeId) -> Result<Self, RegistryError> {
        let mut checker = self.clone();
        checker.check_id(id)?;
        Ok(checker)
    }

    /// Check new type `id`.
    pub fn check_id(&mut self, id: TypeId) -> Result<(), RegistryError> {
        if self.cycle_check.contains(&id) {
            Err(RegistryError::CyclicMetadata { id })
        } else {
            self.cycle_check.push(id);
            Ok(())
        }
    }
}
