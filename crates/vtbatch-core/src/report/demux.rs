//! Turning one group's response back into per-identifier entries.

use serde_json::Value;

use super::result::{LookupResult, ResultMap};
use crate::identifier::RequestGroup;
use crate::scheduler::OperationPanicked;
use crate::transport::{Response, TransportError};

/// Field each record of a multi-item response identifies itself by.
pub const SELF_ID_FIELD: &str = "sha256";

/// Outcome of the pool operation that ran one group's request.
pub(crate) type GroupOutcome = Result<Result<Response, TransportError>, OperationPanicked>;

/// Fold one group's outcome into `map`.
///
/// A failed group (non-200, transport failure, panic, undecodable body) maps
/// every requested identifier to the error marker. A multi-item success is
/// keyed by each record's own `sha256`; records without it are counted as
/// dropped. A single-item success is stored under the requested identifier.
pub(crate) fn absorb(map: &mut ResultMap, group: &RequestGroup, outcome: GroupOutcome) {
    let resp = match outcome {
        Ok(Ok(resp)) if resp.is_success() => resp,
        Ok(Ok(resp)) => {
            tracing::warn!(group = %group.composite_key(), status = resp.status, "lookup group failed");
            return fail_group(map, group);
        }
        Ok(Err(e)) => {
            tracing::warn!(group = %group.composite_key(), "lookup group failed: {}", e);
            return fail_group(map, group);
        }
        Err(panicked) => {
            tracing::warn!(group = %group.composite_key(), "{}", panicked);
            return fail_group(map, group);
        }
    };

    if group.is_multi() {
        let records: Vec<Value> = match resp.json() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(group = %group.composite_key(), "undecodable group response: {}", e);
                return fail_group(map, group);
            }
        };
        for record in records {
            match self_id(&record) {
                Some(id) => map.insert(id, LookupResult::Record(record)),
                None => {
                    tracing::warn!(group = %group.composite_key(), "record without {} dropped", SELF_ID_FIELD);
                    map.record_dropped();
                }
            }
        }
    } else {
        match resp.json::<Value>() {
            Ok(record) => map.insert(group.ids()[0].clone(), LookupResult::Record(record)),
            Err(e) => {
                tracing::warn!(resource = %group.composite_key(), "undecodable response: {}", e);
                fail_group(map, group);
            }
        }
    }
}

fn fail_group(map: &mut ResultMap, group: &RequestGroup) {
    for id in group.ids() {
        map.insert(id.clone(), LookupResult::Error);
    }
}

fn self_id(record: &Value) -> Option<String> {
    record
        .get(SELF_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
