use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;


/// Meeting details recovered from an invitation email.
///
/// Extraction is best-effort, so every field may be absent.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MeetingInfo {
    pub meeting_id: Option<String>,
    pub passcode: Option<String>,
    pub join_link: Option<String>,
    /// Always of the form `19:meeting_<opaque>` when present.
    pub thread_id: Option<String>,
    pub organizer_id: Option<String>,
    pub tenant_id: Option<String>,
}


#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AttendanceData {
    pub reports: Vec<Value>,
    pub attendance_records: Vec<Value>,
}
impl AttendanceData {
    pub fn new(
        reports: Vec<Value>,
        attendance_records: Vec<Value>,
    ) -> Self {
        Self {
            reports,
            attendance_records,
        }
    }
}


/// The document written to disk at the end of a successful run.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PersistedReport {
    pub meeting_info: MeetingInfo,
    pub attendance_data: AttendanceData,
    pub extracted_at: DateTime<Local>,
}
impl PersistedReport {
    pub fn new(
        meeting_info: MeetingInfo,
        attendance_data: AttendanceData,
        extracted_at: DateTime<Local>,
    ) -> Self {
        Self {
            meeting_info,
            attendance_data,
            extracted_at,
        }
    }
}


/// Everything the identity provider handed back for a successful grant.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}
