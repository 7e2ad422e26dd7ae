//! Append-only JSON-lines journal of committed mutations

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::debug;

use super::RemoteSync;
use crate::state::{Mutation, StoreEvent};

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Store commit number; lines are written in this order
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub mutation: Mutation,
}

#[derive(Debug, Clone)]
pub struct JournalSync {
    path: PathBuf,
}

impl JournalSync {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every entry back, oldest first
    pub async fn read_all(path: impl AsRef<Path>) -> anyhow::Result<Vec<JournalEntry>> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read journal {}", path.display()))?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Malformed journal line {} in {}", n + 1, path.display()))
            })
            .collect()
    }
}

async fn append(path: PathBuf, entry: JournalEntry) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(&entry).context("Failed to encode journal entry")?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("Failed to open journal {}", path.display()))?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("Failed to write journal {}", path.display()))?;
    file.flush().await?;

    debug!(
        "Journaled #{} {} for timer {}",
        entry.sequence,
        entry.mutation.kind(),
        entry.mutation.timer_id()
    );
    Ok(())
}

impl RemoteSync for JournalSync {
    fn replicate(&self, event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>> {
        let entry = JournalEntry {
            sequence: event.sequence,
            recorded_at: Utc::now(),
            mutation: event.mutation,
        };
        Box::pin(append(self.path.clone(), entry))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::state::{TimerDraft, TimerId, TimerRecord};

    fn event(sequence: u64, mutation: Mutation) -> StoreEvent {
        StoreEvent { sequence, mutation }
    }

    #[tokio::test]
    async fn appends_one_line_per_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.jsonl");
        let journal = JournalSync::new(&path);

        let timer = TimerRecord::new(TimerId::new("a"), TimerDraft::new("Mow the lawn", "Yard"));
        journal.replicate(event(1, Mutation::Create { timer })).await.unwrap();
        journal
            .replicate(event(
                2,
                Mutation::Start {
                    id: TimerId::new("a"),
                    start: 10,
                },
            ))
            .await
            .unwrap();

        let entries = JournalSync::read_all(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);
        assert_matches!(&entries[0].mutation, Mutation::Create { timer } if timer.title == "Mow the lawn");
        assert_matches!(entries[1].mutation, Mutation::Start { start: 10, .. });
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalSync::new(dir.path().join("nope").join("timers.jsonl"));

        let result = journal.replicate(event(1, Mutation::Delete { id: TimerId::new("a") })).await;
        assert!(result.is_err());
    }

    #[test]
    fn entries_use_tagged_mutations() {
        let line = r#"{"sequence":7,"recorded_at":"2024-01-01T00:00:00Z","mutation":{"type":"stop","id":"a","stop":5000}}"#;
        let entry: JournalEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.sequence, 7);
        assert_eq!(
            entry.mutation,
            Mutation::Stop {
                id: TimerId::new("a"),
                stop: 5000,
            }
        );
    }
}
