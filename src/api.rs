//! Typed endpoints of the ingestion control plane.

use crate::model::{ErrorRecord, Event, IngestionJob, JobId, NewSource, Source, SourceId};
use crate::transport::{ApiError, RequestOptions, Transport};

#[derive(Clone)]
pub struct IngestionApi {
    transport: Transport,
}

impl IngestionApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>, ApiError> {
        self.transport
            .request("/sources", RequestOptions::default())
            .await
    }

    pub async fn create_source(&self, body: &NewSource) -> Result<Source, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.transport
            .request("/sources", RequestOptions::post().with_body(body))
            .await
    }

    pub async fn start_ingestion(&self, source_id: SourceId) -> Result<IngestionJob, ApiError> {
        self.transport
            .request(
                &format!("/sources/{source_id}/ingestions"),
                RequestOptions::post(),
            )
            .await
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<IngestionJob, ApiError> {
        self.transport
            .request(&format!("/ingestions/{job_id}"), RequestOptions::default())
            .await
    }

    pub async fn get_job_events(&self, job_id: JobId) -> Result<Vec<Event>, ApiError> {
        self.transport
            .request(
                &format!("/ingestions/{job_id}/events"),
                RequestOptions::default(),
            )
            .await
    }

    pub async fn get_job_errors(&self, job_id: JobId) -> Result<Vec<ErrorRecord>, ApiError> {
        self.transport
            .request(
                &format!("/ingestions/{job_id}/errors"),
                RequestOptions::default(),
            )
            .await
    }
}
