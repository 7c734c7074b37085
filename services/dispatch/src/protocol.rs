//! Line protocol spoken by the `hive-dispatch` binary.
//!
//! Each input line is one JSON request, answered by one JSON response line.
//! A bare job object (no `op` field) is shorthand for `allocate`:
//!
//! ```text
//! {"id":"job-7","pickup":{"lat":28.70,"lng":77.10},"weight_kg":2.5}
//! {"op":"advance","job_id":"job-7","status":"in_progress"}
//! {"op":"analytics"}
//! ```
//!
//! Responses are `{"ok":true,"result":...}` or
//! `{"ok":false,"kind":"...","error":"..."}`.

use hive_events::{AssignmentStatus, DroneStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::coordinator::Dispatcher;
use crate::model::Job;

/// A request line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Allocate {
        job: Job,
    },
    Advance {
        job_id: String,
        status: AssignmentStatus,
    },
    SetDroneStatus {
        drone_id: String,
        from: DroneStatus,
        to: DroneStatus,
    },
    Rank {
        job: Job,
    },
    Assignment {
        job_id: String,
    },
    Fleet,
    Analytics,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Line {
    Request(Request),
    Job(Job),
}

/// A response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn success(result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                ok: true,
                result: Some(value),
                kind: None,
                error: None,
            },
            Err(e) => Self::failure("serialization", e),
        }
    }

    fn failure(kind: &str, error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            result: None,
            kind: Some(kind.to_string()),
            error: Some(error.to_string()),
        }
    }
}

/// Parses a request line.
pub fn parse_line(line: &str) -> Result<Request, serde_json::Error> {
    Ok(match serde_json::from_str::<Line>(line)? {
        Line::Request(request) => request,
        Line::Job(job) => Request::Allocate { job },
    })
}

/// Parses and executes one line.
pub fn handle_line(dispatcher: &Dispatcher, line: &str) -> Response {
    match parse_line(line) {
        Ok(request) => handle(dispatcher, request),
        Err(e) => {
            debug!(error = %e, "Rejected request line");
            Response::failure("invalid_request", e)
        }
    }
}

/// Executes one request.
pub fn handle(dispatcher: &Dispatcher, request: Request) -> Response {
    match request {
        Request::Allocate { job } => match dispatcher.allocate(&job) {
            Ok(assignment) => Response::success(assignment),
            Err(e) => Response::failure(e.kind(), e),
        },
        Request::Advance { job_id, status } => match dispatcher.advance(&job_id, status) {
            Ok(assignment) => Response::success(assignment),
            Err(e) => Response::failure(e.kind(), e),
        },
        Request::SetDroneStatus { drone_id, from, to } => {
            if dispatcher.set_drone_status(&drone_id, from, to) {
                let drone = dispatcher
                    .fleet_snapshot()
                    .into_iter()
                    .find(|d| d.id.as_str() == drone_id);
                Response::success(drone)
            } else {
                Response::failure(
                    "drone_status_conflict",
                    format!("drone {drone_id} is unknown or not {from}"),
                )
            }
        }
        Request::Rank { job } => Response::success(dispatcher.rank_candidates(&job)),
        Request::Assignment { job_id } => match dispatcher.ledger_entry(&job_id) {
            Ok(assignment) => Response::success(assignment),
            Err(e) => Response::failure(e.kind(), e),
        },
        Request::Fleet => Response::success(dispatcher.fleet_snapshot()),
        Request::Analytics => Response::success(dispatcher.analytics()),
    }
}
