use std::path::PathBuf;

use crate::naming::NamedItem;
use crate::worker::DownloadOutcome;

/// Aggregate result of a finished run. Outcomes are in submission order:
/// `outcomes[i]` belongs to `items[i]`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub collection: String,
    pub directory: PathBuf,
    pub items: Vec<NamedItem>,
    pub outcomes: Vec<DownloadOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub(crate) fn new(
        collection: String,
        directory: PathBuf,
        items: Vec<NamedItem>,
        outcomes: Vec<DownloadOutcome>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            collection,
            directory,
            items,
            outcomes,
            succeeded,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Failure outcomes in submission order.
    pub fn failures(&self) -> Vec<&DownloadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }
}
