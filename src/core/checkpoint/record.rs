//! Checkpoint record and blob naming
//!
//! A checkpoint is a small JSON document stored at
//! `<prefix>/checkpoint/<namespace>/<entity>/<consumer_group>/<partition_id>`.

use super::identity::SourceIdentity;
use crate::domain::PartitionId;
use serde::{Deserialize, Serialize};

/// Last safely processed position for one partition
///
/// Serialized with PascalCase keys:
/// `{"PartitionId","Owner","Token","Epoch","Offset","SequenceNumber"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Checkpoint {
    /// Partition the position belongs to
    pub partition_id: PartitionId,

    /// Id of the processor instance that wrote the record
    pub owner: String,

    /// Unique token of this write
    pub token: String,

    /// Number of writes for this partition by the owner
    pub epoch: u64,

    /// Broker offset of the last flushed event
    pub offset: String,

    /// Sequence number of the last flushed event
    pub sequence_number: i64,
}

impl Checkpoint {
    /// Encode as JSON bytes
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode from JSON bytes
    pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

/// Blob naming for one application prefix and source identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    prefix: String,
    identity: SourceIdentity,
}

impl CheckpointPaths {
    /// Surrounding slashes in `prefix` are ignored; an empty prefix omits the segment
    pub fn new(prefix: &str, identity: SourceIdentity) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            identity,
        }
    }

    pub fn identity(&self) -> &SourceIdentity {
        &self.identity
    }

    /// `<prefix>/checkpoint/`, the root of everything this application owns
    pub fn checkpoint_root(&self) -> String {
        if self.prefix.is_empty() {
            "checkpoint/".to_string()
        } else {
            format!("{}/checkpoint/", self.prefix)
        }
    }

    /// `<root><namespace>/<entity>/`, checkpoints for the current source
    pub fn source_prefix(&self) -> String {
        format!(
            "{}{}/{}/",
            self.checkpoint_root(),
            self.identity.namespace(),
            self.identity.entity()
        )
    }

    /// `<source prefix><consumer_group>/`
    pub fn consumer_group_prefix(&self) -> String {
        format!("{}{}/", self.source_prefix(), self.identity.consumer_group())
    }

    /// Full blob name for `partition_id`
    pub fn blob_name(&self, partition_id: &PartitionId) -> String {
        format!("{}{}", self.consumer_group_prefix(), partition_id)
    }
}
