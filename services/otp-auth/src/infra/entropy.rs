use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::ports::{EntropyError, EntropySource};

/// Operating-system CSPRNG. Errors are reported, never papered over with a weaker source.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError::Source(e.to_string()))
    }
}
