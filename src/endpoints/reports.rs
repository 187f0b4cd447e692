use crate::client::CampaignManagerClient;
use crate::endpoints::files::ReportFile;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A report definition as stored by the reporting API. Only the fields this
/// crate reads are modeled; the rest of the resource passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
}

impl CampaignManagerClient {
    /// Fetch a report definition
    ///
    /// GET /userprofiles/{profile_id}/reports/{report_id}
    ///
    pub async fn get_report(&self, profile_id: &str, report_id: &str) -> Result<Report> {
        let url = format!("{}/reports/{}", self.profile_url(profile_id), report_id);

        let mut request = self.client.get(&url);
        if let Some(token) = self.access_token().await? {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if response.status().is_success() {
            response.json().await.map_err(Error::Http)
        } else if response.status() == 404 {
            Err(Error::NotFound(format!("Report {} not found", report_id)))
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(Error::ApiError { status, message })
        }
    }

    /// Run a report, producing a new report file
    ///
    /// POST /userprofiles/{profile_id}/reports/{report_id}/run
    ///
    pub async fn run_report(
        &self,
        profile_id: &str,
        report_id: &str,
        synchronous: bool,
    ) -> Result<ReportFile> {
        let url = format!("{}/reports/{}/run", self.profile_url(profile_id), report_id);

        let mut request = self
            .client
            .post(&url)
            .query(&[("synchronous", synchronous)]);
        if let Some(token) = self.access_token().await? {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::BadResponse(format!("Failed to parse report file: {}", e)))
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            match status {
                400 => Err(Error::BadRequest(message)),
                401 => Err(Error::Unauthorized),
                429 => Err(Error::RateLimited(None)),
                _ => Err(Error::ApiError { status, message }),
            }
        }
    }

    /// Delete a report definition
    ///
    /// DELETE /userprofiles/{profile_id}/reports/{report_id}
    ///
    pub async fn delete_report(&self, profile_id: &str, report_id: &str) -> Result<()> {
        let url = format!("{}/reports/{}", self.profile_url(profile_id), report_id);

        let mut request = self.client.delete(&url);
        if let Some(token) = self.access_token().await? {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status() == 404 {
            Err(Error::NotFound(format!("Report {} not found", report_id)))
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(Error::ApiError { status, message })
        }
    }
}
