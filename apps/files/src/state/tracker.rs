use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Loading,
    Add,
    Delete,
    Lock,
    Download,
    UsageMetrics,
}

impl OperationKind {
    pub const ALL: [Self; 6] = [
        Self::Loading,
        Self::Add,
        Self::Delete,
        Self::Lock,
        Self::Download,
        Self::UsageMetrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Lock => "lock",
            Self::Download => "download",
            Self::UsageMetrics => "usageMetrics",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[default]
    NotStarted,
    Pending,
    Successful,
    Failed,
    PartialFailure,
    Denied,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Pending)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
    pub status: RequestStatus,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// What subscribers receive whenever a kind's status or errors change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSnapshot {
    pub kind: OperationKind,
    pub status: RequestStatus,
    pub errors: Vec<String>,
}

/// Status plus accumulated error messages, one slot per operation kind.
#[derive(Clone, Debug, Default)]
pub struct OperationTracker {
    operations: BTreeMap<OperationKind, OperationState>,
    dirty: BTreeSet<OperationKind>,
}

impl OperationTracker {
    pub fn status(&self, kind: OperationKind) -> RequestStatus {
        self.operations
            .get(&kind)
            .map(|state| state.status)
            .unwrap_or_default()
    }

    pub fn errors(&self, kind: OperationKind) -> &[String] {
        self.operations
            .get(&kind)
            .map(|state| state.errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn snapshot(&self, kind: OperationKind) -> OperationSnapshot {
        OperationSnapshot {
            kind,
            status: self.status(kind),
            errors: self.errors(kind).to_vec(),
        }
    }

    pub(crate) fn set_status(&mut self, kind: OperationKind, status: RequestStatus) {
        let entry = self.operations.entry(kind).or_default();
        if entry.status != status {
            entry.status = status;
            self.dirty.insert(kind);
        }
    }

    pub(crate) fn push_error(&mut self, kind: OperationKind, message: impl Into<String>) {
        self.operations
            .entry(kind)
            .or_default()
            .errors
            .push(message.into());
        self.dirty.insert(kind);
    }

    pub(crate) fn clear_errors(&mut self, kind: OperationKind) {
        if let Some(entry) = self.operations.get_mut(&kind) {
            if !entry.errors.is_empty() {
                entry.errors.clear();
                self.dirty.insert(kind);
            }
        }
    }

    pub(crate) fn take_dirty(&mut self) -> Vec<OperationSnapshot> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty.into_iter().map(|kind| self.snapshot(kind)).collect()
    }
}
