use crate::client::CampaignManagerClient;
use crate::error::{Error, Result};
use crate::utils::poll_until;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statuses a report file holds while generation is still running.
const IN_PROGRESS_STATUSES: [&str; 2] = ["PROCESSING", "QUEUED"];

/// Metadata of one generated report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    pub id: String,
    #[serde(default)]
    pub report_id: String,
    pub status: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
    #[serde(default)]
    pub urls: Option<FileUrls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUrls {
    #[serde(default)]
    pub browser_url: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl ReportFile {
    /// Whether generation has left the in-progress states. A failed or
    /// cancelled run also reads as ready; callers that care must inspect
    /// `status` afterwards.
    pub fn is_ready(&self) -> bool {
        !IN_PROGRESS_STATUSES.contains(&self.status.as_str())
    }
}

impl CampaignManagerClient {
    /// Fetch a report file's metadata, including its processing status
    ///
    /// GET /userprofiles/{profile_id}/reports/{report_id}/files/{file_id}
    ///
    pub async fn get_report_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
    ) -> Result<ReportFile> {
        let url = format!(
            "{}/reports/{}/files/{}",
            self.profile_url(profile_id),
            report_id,
            file_id
        );

        let mut request = self.client.get(&url);
        if let Some(token) = self.access_token().await? {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if response.status().is_success() {
            let json: serde_json::Value = response.json().await?;

            if json.get("status").and_then(|s| s.as_str()).is_none() {
                return Err(Error::BadResponse("Missing status field".to_string()));
            }

            serde_json::from_value(json).map_err(Error::Json)
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            match status {
                400 => Err(Error::BadRequest(message)),
                401 => Err(Error::Unauthorized),
                404 => Err(Error::NotFound(format!(
                    "Report file {} not found",
                    file_id
                ))),
                429 => Err(Error::RateLimited(None)),
                _ => Err(Error::ApiError { status, message }),
            }
        }
    }

    /// Poll a report file at the given interval until generation leaves the
    /// in-progress states, up to the client's report timeout
    ///
    pub async fn wait_for_report_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
        interval: Duration,
    ) -> Result<ReportFile> {
        let file_id_owned = file_id.to_string();

        poll_until(
            || async move {
                let file = self.get_report_file(profile_id, report_id, file_id).await?;
                if file.is_ready() {
                    Ok(Some(file))
                } else {
                    Ok(None)
                }
            },
            self.report_timeout,
            interval,
        )
        .await
        .map_err(|e| match e {
            Error::PollTimeout => Error::ReportTimeout(file_id_owned),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_with_status(status: &str) -> ReportFile {
        serde_json::from_value(json!({"id": "1", "status": status})).unwrap()
    }

    #[test]
    fn in_progress_statuses_are_not_ready() {
        assert!(!file_with_status("PROCESSING").is_ready());
        assert!(!file_with_status("QUEUED").is_ready());
    }

    #[test]
    fn any_other_status_is_ready() {
        assert!(file_with_status("REPORT_AVAILABLE").is_ready());
        assert!(file_with_status("FAILED").is_ready());
        assert!(file_with_status("CANCELLED").is_ready());
        assert!(file_with_status("SOMETHING_NEW").is_ready());
    }

    #[test]
    fn deserializes_camel_case_file_metadata() {
        let file: ReportFile = serde_json::from_str(
            r#"{
                "kind": "dfareporting#file",
                "id": "9712345",
                "reportId": "333",
                "status": "REPORT_AVAILABLE",
                "fileName": "spend_by_campaign",
                "format": "CSV",
                "urls": {"apiUrl": "https://dfareporting.googleapis.com/reports/333/files/9712345"}
            }"#,
        )
        .unwrap();

        assert_eq!(file.report_id, "333");
        assert_eq!(file.status, "REPORT_AVAILABLE");
        assert_eq!(file.file_name.as_deref(), Some("spend_by_campaign"));
        assert_eq!(
            file.urls.unwrap().api_url.as_deref(),
            Some("https://dfareporting.googleapis.com/reports/333/files/9712345")
        );
    }
}
