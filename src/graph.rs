use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, TokenSource};
use crate::config::AppConfig;


const USER_AGENT: &str = "teamsattend";


#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no access token: {0}")]
    Token(#[from] AuthError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}


fn value_array(mut payload: Value) -> Vec<Value> {
    match payload.get_mut("value").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}


/// Microsoft Graph client for the online-meeting attendance endpoints.
///
/// Every operation returns `Ok(None)` when Graph answers 404 and an error for
/// any other non-success status or transport failure.
pub struct GraphClient<'t> {
    http: Client,
    base_url: String,
    tokens: &'t dyn TokenSource,
}
impl<'t> GraphClient<'t> {
    pub fn new(config: &AppConfig, tokens: &'t dyn TokenSource) -> Result<Self, GraphError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.graph_api_endpoint.clone(),
            tokens,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Value>, GraphError> {
        // re-read on every call so an externally refreshed token is picked up
        let token = self.tokens.bearer_token()?;

        log::debug!("GET {}", url);
        let response = self.http.get(url)
            .query(query)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Status { status, body });
        }
        Ok(Some(response.json().await?))
    }

    /// Looks up the meeting and returns its attendance-report collection.
    ///
    /// A meeting unknown under its plain id is tried once more in the quoted
    /// `onlineMeetings('<id>')` form. The collection itself is always requested
    /// under the plain id.
    pub async fn get_attendance_report(&self, meeting_id: &str) -> Result<Option<Value>, GraphError> {
        let plain_url = format!("{}/me/onlineMeetings/{}", self.base_url, meeting_id);
        match self.get(&plain_url, &[]).await {
            Ok(Some(_)) => {},
            Ok(None) => {
                let quoted_url = format!("{}/me/onlineMeetings('{}')", self.base_url, meeting_id);
                match self.get(&quoted_url, &[]).await {
                    Ok(Some(_)) => {},
                    Ok(None) => {
                        log::warn!("meeting {} not found", meeting_id);
                        return Ok(None);
                    },
                    Err(e) => {
                        log::error!("error fetching meeting {}: {}", meeting_id, e);
                        return Err(e);
                    },
                }
            },
            Err(e) => {
                log::error!("error fetching meeting {}: {}", meeting_id, e);
                return Err(e);
            },
        }

        let reports_url = format!("{}/attendanceReports", plain_url);
        match self.get(&reports_url, &[]).await {
            Ok(Some(reports)) => Ok(Some(reports)),
            Ok(None) => {
                log::warn!("no attendance reports found for meeting {}", meeting_id);
                Ok(None)
            },
            Err(e) => {
                log::error!("error fetching attendance reports for meeting {}: {}", meeting_id, e);
                Err(e)
            },
        }
    }

    pub async fn get_attendance_records(&self, meeting_id: &str, report_id: &str) -> Result<Option<Vec<Value>>, GraphError> {
        let url = format!(
            "{}/me/onlineMeetings/{}/attendanceReports/{}/attendanceRecords",
            self.base_url, meeting_id, report_id,
        );
        match self.get(&url, &[]).await {
            Ok(payload) => Ok(payload.map(value_array)),
            Err(e) => {
                log::error!("error fetching attendance records for report {}: {}", report_id, e);
                Err(e)
            },
        }
    }

    /// Lists the user's online meetings, optionally narrowed by an OData
    /// `$filter` expression that is passed through verbatim.
    pub async fn list_online_meetings(&self, filter_query: Option<&str>) -> Result<Option<Vec<Value>>, GraphError> {
        let url = format!("{}/me/onlineMeetings", self.base_url);
        let query: Vec<(&str, &str)> = filter_query
            .map(|filter| vec![("$filter", filter)])
            .unwrap_or_default();
        match self.get(&url, &query).await {
            Ok(payload) => Ok(payload.map(value_array)),
            Err(e) => {
                log::error!("error listing online meetings: {}", e);
                Err(e)
            },
        }
    }
}
