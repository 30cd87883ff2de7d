//! Consumer that appends events to a JSON-lines file
//!
//! Each event becomes one line. JSON payloads are embedded as JSON, other
//! UTF-8 payloads as strings, and binary payloads are omitted with their
//! length recorded.

use crate::core::consumer::EventConsumer;
use crate::domain::context::ResultExt;
use crate::domain::{EventMessage, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Serialize)]
struct OutputRecord<'a> {
    partition_id: &'a str,
    sequence_number: i64,
    offset: &'a str,
    enqueued_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    body: serde_json::Value,
    body_length: usize,
    #[serde(skip_serializing_if = "no_properties")]
    properties: &'a HashMap<String, serde_json::Value>,
}

fn no_properties(properties: &&HashMap<String, serde_json::Value>) -> bool {
    properties.is_empty()
}

impl<'a> OutputRecord<'a> {
    fn from_event(event: &'a EventMessage) -> Self {
        let body = match event.body_as_str() {
            Some(text) => serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
            None => serde_json::Value::Null,
        };

        Self {
            partition_id: event.partition_id.as_str(),
            sequence_number: event.sequence_number,
            offset: &event.offset,
            enqueued_time: event.enqueued_time,
            content_type: event.content_type.as_deref(),
            body,
            body_length: event.body.len(),
            properties: &event.properties,
        }
    }
}

/// Appends delivered events to a file, one JSON object per line
pub struct JsonlFileConsumer {
    name: String,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFileConsumer {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventConsumer for JsonlFileConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume(&self, events: &[EventMessage]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buffer, &OutputRecord::from_event(event))?;
            buffer.push(b'\n');
        }

        // Batches from different partitions must not interleave within the file.
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(&buffer)
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        file.flush().await?;

        tracing::debug!(
            consumer = %self.name,
            path = %self.path.display(),
            batch_size = events.len(),
            "Appended batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartitionId;
    use serde_json::json;
    use tempfile::TempDir;

    fn event(seq: i64, body: &[u8]) -> EventMessage {
        EventMessage::builder()
            .partition_id(PartitionId::new("3").unwrap())
            .sequence_number(seq)
            .body(body.to_vec())
            .enqueued_time(Utc::now())
            .property("deviceId", json!("ecg-1"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_appends_one_line_per_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("events.jsonl");
        let consumer = JsonlFileConsumer::new("file", &path);

        consumer
            .consume(&[event(1, br#"{"heartRate":72}"#), event(2, b"plain text")])
            .await
            .unwrap();
        consumer.consume(&[event(3, &[0xff, 0xfe])]).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["body"]["heartRate"], 72);
        assert_eq!(lines[0]["properties"]["deviceId"], "ecg-1");
        assert_eq!(lines[1]["body"], "plain text");
        assert_eq!(lines[2]["body"], serde_json::Value::Null);
        assert_eq!(lines[2]["body_length"], 2);
        assert_eq!(lines[2]["partition_id"], "3");
    }
}
