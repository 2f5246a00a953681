use parking_lot::RwLock;
use std::future::Future;
use tracing::{info, warn};

use crate::SummaryError;

/// Ordered model candidates with a memory of the last one that worked.
///
/// Each call starts with the cached model and then walks the rest of the
/// list in order. The first success becomes the new cached model.
#[derive(Debug)]
pub struct ModelFallback {
    candidates: Vec<String>,
    last_success: RwLock<Option<usize>>,
}

impl ModelFallback {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            last_success: RwLock::new(None),
        }
    }

    /// Model that answered most recently
    pub fn current(&self) -> Option<&str> {
        let idx = (*self.last_success.read())?;
        self.candidates.get(idx).map(String::as_str)
    }

    fn attempt_order(&self) -> Vec<usize> {
        let cached = *self.last_success.read();
        let mut order: Vec<usize> = cached.into_iter().collect();
        order.extend((0..self.candidates.len()).filter(|i| Some(*i) != cached));
        order
    }

    /// Run `call` against each candidate until one succeeds
    pub async fn invoke<T, F, Fut>(&self, mut call: F) -> Result<T, SummaryError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SummaryError>>,
    {
        let order = self.attempt_order();
        let mut last_err = None;

        for idx in order.iter().copied() {
            let model = &self.candidates[idx];
            match call(model.clone()).await {
                Ok(value) => {
                    let previous = self.last_success.write().replace(idx);
                    if previous != Some(idx) {
                        info!(%model, "using model");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!(%model, error = %err, "model failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(last) => Err(SummaryError::Exhausted {
                tried: order.len(),
                last: Box::new(last),
            }),
            None => Err(SummaryError::NoModels),
        }
    }
}
