//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Hash-chained audit trail for tracker mutations."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, IntoStaticStr};

const GENESIS_HASH_LEN: usize = 64;

/// Kind of event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// A defect was reported.
    DefectCreated,
    /// A change set was applied to a defect.
    DefectUpdated,
    /// A defect was removed.
    DefectDeleted,
    /// A comment was added to a defect.
    CommentAdded,
    /// An operation was refused by the access policy.
    AccessDenied,
    /// An actor's role was assigned or revoked.
    RoleChanged,
}

impl AuditAction {
    fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Entry recorded in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Actor responsible for the event.
    pub actor: String,
    /// Event kind.
    pub action: AuditAction,
    /// Identifier of the affected defect or actor.
    pub target: String,
    /// Additional context serialized as JSON.
    pub metadata: serde_json::Value,
    /// SHA-256 over the entry contents and previous hash.
    pub hash: String,
    /// Hash of the previous entry (zeros for the first entry).
    pub previous_hash: String,
}

impl AuditEntry {
    fn compute_hash(
        timestamp: DateTime<Utc>,
        actor: &str,
        action: AuditAction,
        target: &str,
        metadata: &serde_json::Value,
        previous_hash: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            timestamp
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_be_bytes(),
        );
        hasher.update(actor.as_bytes());
        hasher.update(action.as_str().as_bytes());
        hasher.update(target.as_bytes());
        hasher.update(metadata.to_string().as_bytes());
        hasher.update(previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn expected_hash(&self, previous_hash: &str) -> String {
        Self::compute_hash(
            self.timestamp,
            &self.actor,
            self.action,
            &self.target,
            &self.metadata,
            previous_hash,
        )
    }
}

/// Audit log backed by a newline-delimited JSON file.
///
/// Appends are serialised through an internal lock so a single log can be
/// shared by reference.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    last_hash: Mutex<String>,
}

impl AuditLog {
    /// Open (or create) an audit log. Existing entries determine the head hash.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create audit directory {}", parent.display()))?;
        }
        let last_hash = read_entries(&path)?
            .last()
            .map(|entry| entry.hash.clone())
            .unwrap_or_else(|| "0".repeat(GENESIS_HASH_LEN));
        Ok(Self {
            path,
            last_hash: Mutex::new(last_hash),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a new audit entry.
    pub fn append(
        &self,
        actor: &str,
        action: AuditAction,
        target: &str,
        metadata: serde_json::Value,
    ) -> Result<AuditEntry> {
        let mut last_hash = self.last_hash.lock();
        let timestamp = Utc::now();
        let hash =
            AuditEntry::compute_hash(timestamp, actor, action, target, &metadata, &last_hash);
        let entry = AuditEntry {
            timestamp,
            actor: actor.to_owned(),
            action,
            target: target.to_owned(),
            metadata,
            hash: hash.clone(),
            previous_hash: last_hash.clone(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("unable to open audit log {}", self.path.display()))?;
        file.write_all(serde_json::to_string(&entry)?.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        *last_hash = hash;
        Ok(entry)
    }

    /// All entries currently on disk, oldest first.
    pub fn entries(&self) -> Result<Vec<AuditEntry>> {
        read_entries(&self.path)
    }

    /// Verify the hash chain (detects edited, dropped, or reordered entries).
    pub fn verify(&self) -> Result<bool> {
        let mut previous = "0".repeat(GENESIS_HASH_LEN);
        for entry in read_entries(&self.path)? {
            if entry.previous_hash != previous || entry.expected_hash(&previous) != entry.hash {
                return Ok(false);
            }
            previous = entry.hash;
        }
        Ok(true)
    }
}

fn read_entries(path: &Path) -> Result<Vec<AuditEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)
        .with_context(|| format!("unable to open audit log {}", path.display()))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}
