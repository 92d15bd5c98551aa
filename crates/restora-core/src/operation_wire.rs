// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON shapes of the operations API and their conversion to domain types.
//!
//! The API follows the protobuf JSON mapping: field names are camelCase,
//! 64-bit integers are usually encoded as strings (numbers are accepted
//! too), enum values use their `STATUS_*` names and the operation payload is
//! a oneof keyed by `operationBackup`, `operationPrune`, ...

use chrono::{DateTime, TimeZone, Utc};
use restora_domain_types::{
    OperationId, OperationKind, OperationQuery, OperationRecord, OperationStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::operation_feed::FeedEvent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("field '{field}' is not a valid 64-bit integer: {value}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("field '{field}' is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: i64 },
    #[error("operation {0} carries no known operation payload")]
    UnknownOperationKind(i64),
}

/// A 64-bit integer as it appears on the wire: a number or a decimal string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireInt64 {
    Number(i64),
    Text(String),
}

impl WireInt64 {
    fn parse(&self, field: &'static str) -> Result<i64, WireError> {
        match self {
            WireInt64::Number(n) => Ok(*n),
            WireInt64::Text(text) => text.trim().parse().map_err(|_| WireError::InvalidInteger {
                field,
                value: text.clone(),
            }),
        }
    }
}

impl From<i64> for WireInt64 {
    fn from(value: i64) -> Self {
        WireInt64::Text(value.to_string())
    }
}

impl Default for WireInt64 {
    fn default() -> Self {
        WireInt64::Number(0)
    }
}

/// Request body for fetching a repository's operation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOperationsRequest {
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub last_n: WireInt64,
}

impl From<&OperationQuery> for GetOperationsRequest {
    fn from(query: &OperationQuery) -> Self {
        Self {
            repo_id: query.repo_id().to_string(),
            plan_id: None,
            last_n: WireInt64::Text(query.max_results().to_string()),
        }
    }
}

const KIND_KEYS: [(&str, OperationKind); 8] = [
    ("operationBackup", OperationKind::Backup),
    ("operationIndexSnapshot", OperationKind::IndexSnapshot),
    ("operationForget", OperationKind::Forget),
    ("operationPrune", OperationKind::Prune),
    ("operationCheck", OperationKind::Check),
    ("operationRestore", OperationKind::Restore),
    ("operationStats", OperationKind::Stats),
    ("operationRunHook", OperationKind::RunHook),
];

fn kind_key(kind: OperationKind) -> &'static str {
    KIND_KEYS
        .iter()
        .find(|(_, k)| *k == kind)
        .map_or("operationBackup", |(key, _)| key)
}

fn status_from_wire(status: &str) -> OperationStatus {
    match status {
        "STATUS_PENDING" => OperationStatus::Pending,
        "STATUS_INPROGRESS" => OperationStatus::InProgress,
        "STATUS_SUCCESS" => OperationStatus::Success,
        "STATUS_WARNING" => OperationStatus::Warning,
        "STATUS_ERROR" => OperationStatus::Error,
        "STATUS_SYSTEM_CANCELLED" => OperationStatus::SystemCancelled,
        "STATUS_USER_CANCELLED" => OperationStatus::UserCancelled,
        _ => OperationStatus::Unknown,
    }
}

fn status_to_wire(status: OperationStatus) -> &'static str {
    match status {
        OperationStatus::Unknown => "STATUS_UNKNOWN",
        OperationStatus::Pending => "STATUS_PENDING",
        OperationStatus::InProgress => "STATUS_INPROGRESS",
        OperationStatus::Success => "STATUS_SUCCESS",
        OperationStatus::Warning => "STATUS_WARNING",
        OperationStatus::Error => "STATUS_ERROR",
        OperationStatus::SystemCancelled => "STATUS_SYSTEM_CANCELLED",
        OperationStatus::UserCancelled => "STATUS_USER_CANCELLED",
    }
}

fn default_status() -> String {
    status_to_wire(OperationStatus::Unknown).to_string()
}

/// An operation as serialized by the operations API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOperation {
    #[serde(default)]
    pub id: WireInt64,
    #[serde(default)]
    pub flow_id: WireInt64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WireInt64>,
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    pub unix_time_start_ms: WireInt64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_time_end_ms: Option<WireInt64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_message: Option<String>,
    /// The oneof payload (`operationBackup`, ...) and any other fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

fn timestamp(field: &'static str, millis: i64) -> Result<DateTime<Utc>, WireError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(WireError::InvalidTimestamp { field, value: millis })
}

impl TryFrom<WireOperation> for OperationRecord {
    type Error = WireError;

    fn try_from(wire: WireOperation) -> Result<Self, Self::Error> {
        let id = wire.id.parse("id")?;
        let kind = KIND_KEYS
            .iter()
            .find(|(key, _)| wire.payload.contains_key(*key))
            .map(|(_, kind)| *kind)
            .ok_or(WireError::UnknownOperationKind(id))?;

        // zero ids mean "unset" in the proto3 mapping
        let parent_id = match &wire.parent_id {
            Some(parent) => Some(parent.parse("parentId")?).filter(|p| *p != 0),
            None => None,
        };
        let ended_at = match &wire.unix_time_end_ms {
            Some(end) => Some(end.parse("unixTimeEndMs")?)
                .filter(|ms| *ms != 0)
                .map(|ms| timestamp("unixTimeEndMs", ms))
                .transpose()?,
            None => None,
        };

        Ok(OperationRecord {
            id: OperationId(id),
            flow_id: wire.flow_id.parse("flowId")?,
            parent_id: parent_id.map(OperationId),
            repo_id: wire.repo_id,
            plan_id: wire.plan_id.filter(|p| !p.is_empty()),
            snapshot_id: wire.snapshot_id.filter(|s| !s.is_empty()),
            started_at: timestamp("unixTimeStartMs", wire.unix_time_start_ms.parse("unixTimeStartMs")?)?,
            ended_at,
            status: status_from_wire(&wire.status),
            kind,
            display_message: wire.display_message.filter(|m| !m.is_empty()),
        })
    }
}

impl From<&OperationRecord> for WireOperation {
    fn from(record: &OperationRecord) -> Self {
        let mut payload = Map::new();
        payload.insert(kind_key(record.kind).to_string(), Value::Object(Map::new()));
        Self {
            id: record.id.0.into(),
            flow_id: record.flow_id.into(),
            parent_id: record.parent_id.map(|p| p.0.into()),
            repo_id: record.repo_id.clone(),
            plan_id: record.plan_id.clone(),
            snapshot_id: record.snapshot_id.clone(),
            unix_time_start_ms: record.started_at.timestamp_millis().into(),
            unix_time_end_ms: record.ended_at.map(|t| t.timestamp_millis().into()),
            status: status_to_wire(record.status).to_string(),
            display_message: record.display_message.clone(),
            payload,
        }
    }
}

/// A change notification pushed by the operations API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationEventWire {
    CreatedOperations(Vec<WireOperation>),
    UpdatedOperations(Vec<WireOperation>),
    DeletedOperations(Vec<WireInt64>),
}

impl TryFrom<OperationEventWire> for FeedEvent {
    type Error = WireError;

    fn try_from(event: OperationEventWire) -> Result<Self, Self::Error> {
        match event {
            OperationEventWire::CreatedOperations(ops) | OperationEventWire::UpdatedOperations(ops) => {
                let records = ops
                    .into_iter()
                    .map(OperationRecord::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FeedEvent::Upserted(records))
            }
            OperationEventWire::DeletedOperations(ids) => {
                let ids = ids
                    .iter()
                    .map(|id| id.parse("deletedOperations").map(OperationId))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FeedEvent::Deleted(ids))
            }
        }
    }
}

/// Failure decoding an operations payload
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed operations JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Parse a JSON array of operations
pub fn records_from_json(json: &str) -> Result<Vec<OperationRecord>, DecodeError> {
    let wire: Vec<WireOperation> = serde_json::from_str(json)?;
    Ok(wire
        .into_iter()
        .map(OperationRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_last_n_as_string() {
        let request = GetOperationsRequest::from(&OperationQuery::new("repo1", 50));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"repoId": "repo1", "lastN": "50"})
        );
    }

    #[test]
    fn decodes_operation_with_string_integers() {
        let wire: WireOperation = serde_json::from_value(json!({
            "id": "1843",
            "flowId": "1840",
            "parentId": "1840",
            "repoId": "repo1",
            "planId": "home",
            "snapshotId": "b6f4e1c2",
            "unixTimeStartMs": "1735689600000",
            "unixTimeEndMs": 1735689660000i64,
            "status": "STATUS_SUCCESS",
            "operationIndexSnapshot": {"snapshot": {"id": "b6f4e1c2"}}
        }))
        .unwrap();

        let record = OperationRecord::try_from(wire).unwrap();
        assert_eq!(record.id, OperationId(1843));
        assert_eq!(record.flow_id, 1840);
        assert_eq!(record.parent_id, Some(OperationId(1840)));
        assert_eq!(record.kind, OperationKind::IndexSnapshot);
        assert_eq!(record.status, OperationStatus::Success);
        assert_eq!(record.plan_id.as_deref(), Some("home"));
        assert_eq!(record.duration(), Some(chrono::Duration::seconds(60)));
    }

    #[test]
    fn zero_parent_and_missing_status_mean_unset() {
        let wire: WireOperation = serde_json::from_value(json!({
            "id": 5,
            "parentId": "0",
            "repoId": "repo1",
            "unixTimeStartMs": 0,
            "operationCheck": {}
        }))
        .unwrap();
        let record = OperationRecord::try_from(wire).unwrap();
        assert_eq!(record.parent_id, None);
        assert_eq!(record.ended_at, None);
        assert_eq!(record.status, OperationStatus::Unknown);
    }

    #[test]
    fn rejects_unknown_payload() {
        let wire: WireOperation = serde_json::from_value(json!({
            "id": "9",
            "repoId": "repo1",
            "unixTimeStartMs": "0",
            "operationTeleport": {}
        }))
        .unwrap();
        assert_eq!(
            OperationRecord::try_from(wire),
            Err(WireError::UnknownOperationKind(9))
        );
    }

    #[test]
    fn rejects_malformed_integer() {
        let wire: WireOperation = serde_json::from_value(json!({
            "id": "nine",
            "repoId": "repo1",
            "unixTimeStartMs": "0",
            "operationBackup": {}
        }))
        .unwrap();
        assert_eq!(
            OperationRecord::try_from(wire),
            Err(WireError::InvalidInteger {
                field: "id",
                value: "nine".into()
            })
        );
    }

    #[test]
    fn rejects_out_of_range_timestamp() {
        let wire: WireOperation = serde_json::from_value(json!({
            "id": "1",
            "repoId": "repo1",
            "unixTimeStartMs": i64::MAX.to_string(),
            "operationBackup": {}
        }))
        .unwrap();
        assert!(matches!(
            OperationRecord::try_from(wire),
            Err(WireError::InvalidTimestamp { field: "unixTimeStartMs", .. })
        ));
    }

    #[test]
    fn record_survives_wire_encoding() {
        let record = OperationRecord::new(
            "repo1",
            OperationKind::Prune,
            Utc.timestamp_millis_opt(1_735_689_600_000).unwrap(),
        )
        .with_plan("home")
        .with_status(OperationStatus::Warning);

        let json = serde_json::to_value(WireOperation::from(&record)).unwrap();
        assert_eq!(json["status"], "STATUS_WARNING");
        assert!(json.get("operationPrune").is_some());

        let wire: WireOperation = serde_json::from_value(json).unwrap();
        assert_eq!(OperationRecord::try_from(wire).unwrap(), record);
    }

    #[test]
    fn decodes_change_events() {
        let event: OperationEventWire =
            serde_json::from_value(json!({"deletedOperations": ["3", 4]})).unwrap();
        assert_eq!(
            FeedEvent::try_from(event).unwrap(),
            FeedEvent::Deleted(vec![OperationId(3), OperationId(4)])
        );

        let event: OperationEventWire = serde_json::from_value(json!({
            "createdOperations": [{
                "id": "1",
                "repoId": "repo1",
                "unixTimeStartMs": "1000",
                "operationBackup": {}
            }]
        }))
        .unwrap();
        match FeedEvent::try_from(event).unwrap() {
            FeedEvent::Upserted(records) => assert_eq!(records[0].kind, OperationKind::Backup),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn records_from_json_reports_decode_errors() {
        assert!(matches!(records_from_json("{"), Err(DecodeError::Json(_))));
        assert!(matches!(
            records_from_json(r#"[{"id": "1", "repoId": "r", "unixTimeStartMs": "0"}]"#),
            Err(DecodeError::Wire(WireError::UnknownOperationKind(1)))
        ));
        assert!(records_from_json("[]").unwrap().is_empty());
    }
}
