use crate::client::CampaignManagerClient;
use crate::config::{ImpersonationChain, DEFAULT_API_VERSION, DEFAULT_CONNECTION_ID};
use crate::endpoints::files::ReportFile;
use crate::error::Result;
use crate::utils::poll_until;
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// How the host scheduler spaces polls: `Blocking` keeps the execution slot
/// and sleeps between polls, `Reschedule` releases the slot until the next
/// poll is due. The sensor only carries the setting; the scheduler enforces
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    Blocking,
    #[default]
    Reschedule,
}

/// Execution context handed down by the scheduler on each poll. Opaque to
/// the sensor itself.
#[derive(Debug, Clone, Default)]
pub struct PollContext {
    pub task_id: Option<String>,
    pub attempt: u32,
}

/// A check the scheduler polls until it reports readiness or gives up.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// One poll. `false` means "not done yet, poll again later".
    async fn is_ready(&self, ctx: &PollContext) -> Result<bool>;

    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    fn poll_mode(&self) -> PollMode {
        PollMode::default()
    }

    /// Field names the host may resolve from deferred expressions before
    /// each poll.
    fn template_fields(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Source of report-file status, as consumed by [`ReportFileSensor`].
#[async_trait]
pub trait ReportFileStatusSource: Send + Sync {
    async fn report_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
    ) -> Result<ReportFile>;
}

#[async_trait]
impl ReportFileStatusSource for CampaignManagerClient {
    async fn report_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
    ) -> Result<ReportFile> {
        self.get_report_file(profile_id, report_id, file_id).await
    }
}

/// Checks whether a report file has finished generating.
///
/// Ready means the file's status has left the in-progress states. A failed
/// or cancelled run also reads as ready; the caller owns inspecting the
/// final status afterwards.
pub struct ReportFileSensor {
    profile_id: String,
    report_id: String,
    file_id: String,
    api_version: String,
    connection_id: String,
    poll_mode: PollMode,
    poll_interval: Duration,
    impersonation_chain: Option<ImpersonationChain>,
}

impl ReportFileSensor {
    pub fn new(
        profile_id: impl Into<String>,
        report_id: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            report_id: report_id.into(),
            file_id: file_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connection_id: DEFAULT_CONNECTION_ID.to_string(),
            poll_mode: PollMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            impersonation_chain: None,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = connection_id.into();
        self
    }

    pub fn with_poll_mode(mut self, poll_mode: PollMode) -> Self {
        self.poll_mode = poll_mode;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_impersonation_chain(mut self, chain: impl Into<ImpersonationChain>) -> Self {
        self.impersonation_chain = Some(chain.into());
        self
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn impersonation_chain(&self) -> Option<&ImpersonationChain> {
        self.impersonation_chain.as_ref()
    }

    fn build_hook(&self) -> Result<CampaignManagerClient> {
        let mut builder = CampaignManagerClient::builder()
            .connection_id(self.connection_id.as_str())
            .api_version(self.api_version.as_str());

        if let Some(chain) = &self.impersonation_chain {
            builder = builder.impersonation_chain(chain.clone());
        }

        builder.build()
    }

    /// One readiness probe against the given status source.
    pub async fn probe(&self, source: &dyn ReportFileStatusSource) -> Result<bool> {
        let response = source
            .report_file(&self.profile_id, &self.report_id, &self.file_id)
            .await?;

        tracing::info!("Report status: {}", response.status);

        Ok(response.is_ready())
    }
}

#[async_trait]
impl Sensor for ReportFileSensor {
    async fn is_ready(&self, _ctx: &PollContext) -> Result<bool> {
        let hook = self.build_hook()?;
        self.probe(&hook).await
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn poll_mode(&self) -> PollMode {
        self.poll_mode
    }

    fn template_fields(&self) -> &'static [&'static str] {
        &["profile_id", "report_id", "file_id", "impersonation_chain"]
    }
}

/// Drive a sensor in blocking mode: poll at its configured interval until it
/// reports ready or `timeout` elapses.
pub async fn wait_until_ready<S: Sensor + ?Sized>(
    sensor: &S,
    ctx: &PollContext,
    timeout: Duration,
) -> Result<()> {
    poll_until(
        || async move {
            if sensor.is_ready(ctx).await? {
                Ok(Some(()))
            } else {
                Ok(None)
            }
        },
        timeout,
        sensor.poll_interval(),
    )
    .await
}
