//! Decoded state of a remote task.

use crate::messages::TaskStatusData;

/// Where a remote task currently stands.
///
/// `Succeeded` and `Failed` are terminal: once either is observed no
/// further transitions are expected or trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running {
        /// Completion percentage reported by the service (0-100).
        progress: u8,
        /// Estimated seconds until completion, if reported.
        eta_seconds: Option<u64>,
    },
    Succeeded {
        /// Download URL of the finished model, exactly as reported.
        artifact_url: String,
    },
    Failed {
        reason: String,
    },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// Remote status strings that end a task without a usable result.
const FAILED_STATUSES: &[&str] = &["failed", "cancelled", "banned", "expired", "unknown"];

impl TryFrom<TaskStatusData> for TaskStatus {
    type Error = String;

    /// Interpret a status payload.
    ///
    /// `result.model.url` is only required when the status is `success`.
    /// Unrecognised status strings are rejected so the caller can treat
    /// them as a malformed response.
    fn try_from(data: TaskStatusData) -> Result<Self, Self::Error> {
        match data.status.as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running {
                progress: data.progress.unwrap_or(0).min(100) as u8,
                eta_seconds: data.running_left_time,
            }),
            "success" => data
                .result
                .and_then(|r| r.model)
                .map(|m| Self::Succeeded { artifact_url: m.url })
                .ok_or_else(|| "status is success but result.model.url is missing".to_string()),
            s if FAILED_STATUSES.contains(&s) => Ok(Self::Failed {
                reason: format!("task {s}"),
            }),
            other => Err(format!("unrecognised task status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Result<TaskStatus, String> {
        let data: TaskStatusData = serde_json::from_value(value).unwrap();
        TaskStatus::try_from(data)
    }

    #[test]
    fn queued() {
        assert_eq!(decode(json!({ "status": "queued" })), Ok(TaskStatus::Queued));
    }

    #[test]
    fn running_carries_progress_and_eta() {
        let status = decode(json!({
            "status": "running",
            "progress": 40,
            "running_left_time": 12
        }));
        assert_eq!(
            status,
            Ok(TaskStatus::Running {
                progress: 40,
                eta_seconds: Some(12)
            })
        );
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        let status = decode(json!({ "status": "running", "progress": 1000 }));
        assert_eq!(
            status,
            Ok(TaskStatus::Running {
                progress: 100,
                eta_seconds: None
            })
        );
    }

    #[test]
    fn success_returns_url_unmodified() {
        let url = "https://cdn.example.com/a/b/model.usdz?sig=abc%2F&exp=1";
        let status = decode(json!({
            "status": "success",
            "result": { "model": { "type": "usdz", "url": url } }
        }));
        assert_eq!(
            status,
            Ok(TaskStatus::Succeeded {
                artifact_url: url.to_string()
            })
        );
    }

    #[test]
    fn success_without_url_is_rejected() {
        assert!(decode(json!({ "status": "success", "result": {} })).is_err());
        assert!(decode(json!({ "status": "success" })).is_err());
    }

    #[test]
    fn failure_statuses_are_terminal() {
        for s in FAILED_STATUSES {
            let status = decode(json!({ "status": s })).unwrap();
            assert!(status.is_terminal(), "{s} should be terminal");
            assert!(matches!(status, TaskStatus::Failed { .. }));
        }
    }

    #[test]
    fn unknown_status_string_is_an_error() {
        assert!(decode(json!({ "status": "teleporting" })).is_err());
    }

    #[test]
    fn non_terminal_states() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running {
            progress: 1,
            eta_seconds: None
        }
        .is_terminal());
    }
}
