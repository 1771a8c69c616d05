use crate::{Error, RecommendationEngine, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

/// One-shot readiness barrier in front of the engine.
///
/// Query entry points hold an `Arc<SharedEngine>` from startup and get
/// [`Error::NotReady`] until the loader installs the engine. The slot can be
/// filled exactly once; the engine is never swapped afterwards.
#[derive(Debug, Default)]
pub struct SharedEngine {
    slot: OnceCell<Arc<RecommendationEngine>>,
}

impl SharedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Already-loaded engine, ready from the start
    pub fn ready(engine: RecommendationEngine) -> Self {
        let shared = Self::new();
        let _ = shared.slot.set(Arc::new(engine));
        shared
    }

    pub fn install(&self, engine: RecommendationEngine) -> Result<Arc<RecommendationEngine>> {
        let items = engine.catalog().len();
        let engine = Arc::new(engine);
        self.slot
            .set(engine.clone())
            .map_err(|_| Error::InvalidConfig("engine already loaded".to_string()))?;
        info!(items, "recommendation engine ready");
        Ok(engine)
    }

    pub fn get(&self) -> Result<Arc<RecommendationEngine>> {
        self.slot.get().cloned().ok_or(Error::NotReady)
    }

    /// Block the calling thread until an engine is installed
    pub fn wait(&self) -> Arc<RecommendationEngine> {
        self.slot.wait().clone()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }
}
