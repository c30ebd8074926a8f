use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, Authenticator};
use crate::config::AppConfig;
use crate::email::extract_meeting_info;
use crate::graph::{GraphClient, GraphError};
use crate::model::{AttendanceData, MeetingInfo, PersistedReport};


pub const DEFAULT_OUTPUT_DIR: &str = "attendance_reports";
const RULE_WIDTH: usize = 60;


/// How the pipeline obtains its access token.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AuthMethod {
    Password,
    AuthorizationCode(String),
}


/// Reasons a run stops before a report is written.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not extract the meeting thread ID from the email")]
    MissingThreadId,

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("failed to set up the Graph client: {0}")]
    Client(#[from] GraphError),

    #[error("could not retrieve the attendance report")]
    ReportUnavailable,

    #[error("no attendance reports found in the response")]
    NoReports,

    #[error("failed to write {}: {source}", .path.display())]
    Persist { path: PathBuf, source: std::io::Error },

    #[error("failed to serialize the attendance report: {0}")]
    Serialize(#[from] serde_json::Error),
}
impl RunError {
    /// Hints printed along with the error, if any.
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            Self::ReportUnavailable => &[
                "The meeting hasn't ended yet (attendance reports are only available after the meeting)",
                "You don't have permission to access this meeting's attendance",
                "The meeting ID format might be incorrect",
            ],
            _ => &[],
        }
    }
}


fn rule(c: char) -> String {
    std::iter::repeat(c).take(RULE_WIDTH).collect()
}

fn str_at<'v>(value: &'v Value, pointer: &str) -> Option<&'v str> {
    value.pointer(pointer).and_then(Value::as_str)
}


/// Fetches the records of every report and concatenates them.
///
/// A report whose records cannot be fetched contributes nothing.
pub async fn collect_attendance_records(client: &GraphClient<'_>, meeting_id: &str, reports: &[Value]) -> Vec<Value> {
    let mut all_records = Vec::new();
    for report in reports {
        let Some(report_id) = str_at(report, "/id") else {
            log::warn!("skipping attendance report without an id");
            continue;
        };
        println!("\nFetching records for report: {}", report_id);
        match client.get_attendance_records(meeting_id, report_id).await {
            Ok(Some(records)) => {
                println!("  Found {} attendance record(s)", records.len());
                all_records.extend(records);
            },
            Ok(None) => println!("  No attendance records found"),
            Err(_) => println!("  Could not fetch attendance records"),
        }
    }
    all_records
}


pub fn report_file_name(meeting_info: &MeetingInfo, timestamp: &DateTime<Local>) -> String {
    let meeting_id_clean = meeting_info.meeting_id.as_deref()
        .unwrap_or("unknown")
        .replace(' ', "_");
    format!("attendance_{}_{}.json", meeting_id_clean, timestamp.format("%Y%m%d_%H%M%S"))
}


/// Writes the report as pretty JSON into `output_dir` and returns its path.
pub fn save_attendance_report(
    meeting_info: &MeetingInfo,
    attendance_data: &AttendanceData,
    output_dir: &Path,
    extracted_at: DateTime<Local>,
) -> Result<PathBuf, RunError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|source| RunError::Persist { path: output_dir.to_owned(), source })?;

    let path = output_dir.join(report_file_name(meeting_info, &extracted_at));
    let report = PersistedReport::new(
        meeting_info.clone(),
        attendance_data.clone(),
        extracted_at,
    );
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json)
        .map_err(|source| RunError::Persist { path: path.clone(), source })?;

    println!("Attendance report saved to: {}", path.display());
    Ok(path)
}


pub fn format_summary(meeting_info: &MeetingInfo, records: &[Value]) -> String {
    let double_rule = rule('=');
    let mut lines = vec![
        double_rule.clone(),
        "ATTENDANCE SUMMARY".to_owned(),
        double_rule,
        format!("Meeting ID: {}", meeting_info.meeting_id.as_deref().unwrap_or("N/A")),
        format!("Total Records: {}", records.len()),
    ];

    if !records.is_empty() {
        lines.push(String::new());
        lines.push("Attendees:".to_owned());
        for (i, record) in records.iter().enumerate() {
            let name = str_at(record, "/identity/emailAddress/name").unwrap_or("N/A");
            let email = str_at(record, "/identity/emailAddress/address").unwrap_or("N/A");
            let joined = str_at(record, "/joinDateTime").unwrap_or("N/A");
            let left = str_at(record, "/leaveDateTime").unwrap_or("N/A");
            let duration = record.get("totalAttendanceInSeconds")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            lines.push(format!("  {}. {} ({})", i + 1, name, email));
            lines.push(format!("     Joined: {}, Left: {}", joined, left));
            lines.push(format!("     Duration: {} seconds", duration));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}


/// Parses the invitation, authenticates, fetches attendance and writes the
/// report into `output_dir`.
pub async fn process_email_html(
    config: &AppConfig,
    html_body: &str,
    auth_method: AuthMethod,
    output_dir: &Path,
) -> Result<PathBuf, RunError> {
    println!("Parsing email HTML...");
    let meeting_info = extract_meeting_info(html_body);
    println!("Extracted meeting info:");
    println!("{}", serde_json::to_string_pretty(&meeting_info)?);

    let Some(meeting_id) = meeting_info.thread_id.clone() else {
        return Err(RunError::MissingThreadId);
    };

    println!("\nAuthenticating with Microsoft Graph API...");
    let mut auth = Authenticator::new(config)?;
    match auth_method {
        AuthMethod::Password => {
            auth.authenticate_with_password().await?;
            println!("Authentication successful (password grant)");
        },
        AuthMethod::AuthorizationCode(code) => {
            auth.authenticate_with_code(&code).await?;
            println!("Authentication successful (authorization code grant)");
        },
    }

    let client = GraphClient::new(config, &auth)?;

    println!("\nFetching attendance report for meeting: {}", meeting_id);
    let collection = match client.get_attendance_report(&meeting_id).await {
        Ok(Some(collection)) => collection,
        Ok(None) | Err(_) => return Err(RunError::ReportUnavailable),
    };
    println!("Attendance report retrieved successfully");

    let reports: Vec<Value> = match collection.get("value") {
        Some(Value::Array(reports)) if !reports.is_empty() => reports.clone(),
        _ => return Err(RunError::NoReports),
    };
    println!("Found {} attendance report(s)", reports.len());

    let records = collect_attendance_records(&client, &meeting_id, &reports).await;
    let attendance_data = AttendanceData::new(reports, records);
    let path = save_attendance_report(&meeting_info, &attendance_data, output_dir, Local::now())?;

    println!();
    print!("{}", format_summary(&meeting_info, &attendance_data.attendance_records));

    Ok(path)
}
