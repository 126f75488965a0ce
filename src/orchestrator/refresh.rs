//! Read-side refresh steps.
//!
//! Each step fetches first and only touches session state once everything it needs has arrived.

use crate::api::IngestionApi;
use crate::model::{JobDetail, JobId};
use crate::session::SessionState;
use crate::transport::ApiError;

/// Fetch the full source list and replace local state with it.
pub(crate) async fn list_sources(
    api: &IngestionApi,
    state: &mut SessionState,
) -> Result<(), ApiError> {
    let sources = api.list_sources().await?;
    tracing::debug!(count = sources.len(), "sources refreshed");
    state.replace_sources(sources);
    Ok(())
}

/// Fetch a job, then its events, then its errors. Any failure fails the whole unit.
pub(crate) async fn load_job_detail(
    api: &IngestionApi,
    job_id: JobId,
) -> Result<JobDetail, ApiError> {
    let job = api.get_job(job_id).await?;
    let events = api.get_job_events(job_id).await?;
    let errors = api.get_job_errors(job_id).await?;
    Ok(JobDetail {
        job,
        events,
        errors,
    })
}
