use std::sync::Arc;

use festflow_core::config::PipelineConfig;
use festflow_core::dataset::Dataset;
use festflow_core::error::CoreError;
use festflow_core::frequency::FrequencySource;
use festflow_core::pipeline::{self, PipelineOutput};
use tokio::sync::RwLock;

use crate::config::{DataConfig, ServerConfig};

/// A loaded dataset together with the pipeline output computed from it.
///
/// Immutable once built; requests hold an `Arc` to it for their whole
/// lifetime, so a concurrent reload never changes what they see.
#[derive(Debug)]
pub struct Snapshot {
    pub dataset: Dataset,
    pub output: PipelineOutput,
}

impl Snapshot {
    pub fn build(
        dataset: Dataset,
        config: &PipelineConfig,
        frequency: &dyn FrequencySource,
    ) -> Result<Self, CoreError> {
        let output = pipeline::run(&dataset, config, frequency)?;
        Ok(Self { dataset, output })
    }
}

/// Holder for the current [`Snapshot`], replaced wholesale on reload.
#[derive(Debug)]
pub struct DatasetStore {
    current: RwLock<Arc<Snapshot>>,
}

impl DatasetStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Swap in a new snapshot, returning the one it replaced.
    pub async fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Where data is reloaded from.
    pub data_config: Arc<DataConfig>,
    /// Validated pipeline settings.
    pub pipeline_config: Arc<PipelineConfig>,
    /// Current dataset and derived tables.
    pub store: Arc<DatasetStore>,
}

#[cfg(test)]
mod tests {
    use festflow_core::frequency::NoServiceData;
    use festflow_core::model::PerformanceRecord;

    use super::*;

    fn snapshot(records: Vec<PerformanceRecord>) -> Snapshot {
        Snapshot::build(
            Dataset::new(records, Vec::new()),
            &PipelineConfig::default(),
            &NoServiceData,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_across_replace() {
        let store = DatasetStore::new(snapshot(Vec::new()));
        let before = store.snapshot().await;

        let mut record = PerformanceRecord::new("e1", "v1", chrono::Utc::now());
        record.venue_lat = Some(55.95);
        record.venue_lon = Some(-3.19);
        let old = store.replace(snapshot(vec![record])).await;

        assert!(Arc::ptr_eq(&before, &old));
        assert!(before.dataset.records().is_empty());
        assert_eq!(store.snapshot().await.dataset.records().len(), 1);
        assert_eq!(store.snapshot().await.output.venues.len(), 1);
    }
}
