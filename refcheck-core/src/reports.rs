//! Typed report payloads.
//!
//! One variant per report kind, so rendering logic can match exhaustively
//! instead of probing an untyped blob.

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Which aggregate report the server should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    TasksByStatus,
    TasksByUser,
    TasksByBoard,
    TasksByPriority,
}

impl ReportKind {
    /// Path segment for the report endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TasksByStatus => "tasks-by-status",
            ReportKind::TasksByUser => "tasks-by-user",
            ReportKind::TasksByBoard => "tasks-by-board",
            ReportKind::TasksByPriority => "tasks-by-priority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCount {
    pub user_id: EntityId,
    pub user_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCount {
    pub board_id: EntityId,
    pub board_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCount {
    pub priority: String,
    pub count: u64,
}

/// A report result, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "camelCase")]
pub enum ReportPayload {
    TasksByStatus(Vec<StatusCount>),
    TasksByUser(Vec<UserCount>),
    TasksByBoard(Vec<BoardCount>),
    TasksByPriority(Vec<PriorityCount>),
}

impl ReportPayload {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportPayload::TasksByStatus(_) => ReportKind::TasksByStatus,
            ReportPayload::TasksByUser(_) => ReportKind::TasksByUser,
            ReportPayload::TasksByBoard(_) => ReportKind::TasksByBoard,
            ReportPayload::TasksByPriority(_) => ReportKind::TasksByPriority,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
