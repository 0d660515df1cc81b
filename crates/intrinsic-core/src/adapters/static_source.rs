use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::data_source::{
    FundamentalsProvider, FundamentalsRequest, HealthState, HealthStatus, ProviderFuture,
    SourceError,
};
use crate::{CoreError, FundamentalSnapshot, ProviderId, Ticker};

/// Provider backed by snapshots held in memory.
///
/// Serves `--source file` in the CLI and doubles as the fixture provider in tests.
/// A source built with [`StaticSource::failing`] rejects every request, which models a
/// provider outage.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshots: BTreeMap<Ticker, FundamentalSnapshot>,
    outage: Option<SourceError>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<FundamentalSnapshot>),
    One(FundamentalSnapshot),
}

impl StaticSource {
    pub fn new(snapshots: impl IntoIterator<Item = FundamentalSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|snapshot| (snapshot.ticker.clone(), snapshot.normalized()))
                .collect(),
            outage: None,
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            snapshots: BTreeMap::new(),
            outage: Some(error),
        }
    }

    /// Parses a JSON document holding one snapshot object or an array of them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let snapshots = match serde_json::from_str::<SnapshotFile>(json)? {
            SnapshotFile::Many(snapshots) => snapshots,
            SnapshotFile::One(snapshot) => vec![snapshot],
        };
        Ok(Self::new(snapshots))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let source = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), tickers = source.len(), "loaded snapshot file");
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FundamentalsProvider for StaticSource {
    fn id(&self) -> ProviderId {
        ProviderId::Static
    }

    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> ProviderFuture<'a, Result<FundamentalSnapshot, SourceError>> {
        Box::pin(async move {
            if let Some(error) = &self.outage {
                return Err(error.clone());
            }
            self.snapshots
                .get(&req.ticker)
                .cloned()
                .ok_or_else(|| SourceError::not_found(&req.ticker))
        })
    }

    fn health<'a>(&'a self) -> ProviderFuture<'a, HealthStatus> {
        Box::pin(async move {
            match self.outage {
                Some(_) => HealthStatus::new(HealthState::Unhealthy, false),
                None => HealthStatus::healthy(),
            }
        })
    }
}
