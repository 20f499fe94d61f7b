use serde::{Deserialize, Serialize};

use super::time::Minutes;

/// The `{min, std, max}` processing-time envelope for a charge at a stage.
///
/// The dispatch kernel only ever dispatches on [`TimeEnvelope::std`], but the full envelope
/// is kept so that a caller exploring min/max schedules (e.g. a robustness analysis) has it
/// available without re-reading the instance tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEnvelope {
    pub min: Minutes,
    pub std: Minutes,
    pub max: Minutes,
}

/// Which member of a [`TimeEnvelope`] to use for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingTimeKind {
    Min,
    Standard,
    Max,
}

impl TimeEnvelope {
    pub fn get(&self, kind: ProcessingTimeKind) -> Minutes {
        match kind {
            ProcessingTimeKind::Min => self.min,
            ProcessingTimeKind::Standard => self.std,
            ProcessingTimeKind::Max => self.max,
        }
    }
}
