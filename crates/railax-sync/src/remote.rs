//! # Booking API Client
//!
//! The remote authority the engine reconciles against, behind the
//! [`BookingRemote`] trait so sweeps and the service can be driven by an
//! in-process fake.
//!
//! ## Status Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Response                 │  Result                                     │
//! │  ─────────────────────────┼──────────────────────────────────────────── │
//! │  2xx                      │  Ok(CreateAck::Accepted) / Ok(())           │
//! │  409 on create            │  Ok(CreateAck::AlreadyExists)               │
//! │  other status             │  Err(Rejected { status, body })             │
//! │  connect / DNS / TLS      │  Err(Network)                               │
//! │  deadline exceeded        │  Err(Timeout(request_timeout_secs))         │
//! │  2xx with bad JSON        │  Err(MalformedResponse)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::{CheckoutRequest, CreateBookingDto, HallTypesResponse};

/// How the remote answered a successful bulk create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAck {
    Accepted,
    /// 409: the remote already holds these identifiers.
    AlreadyExists,
}

/// Remote operations used by the reconciliation engines.
#[async_trait]
pub trait BookingRemote: Send + Sync {
    /// `POST /Booking/create` with the whole batch as one JSON array.
    async fn create_bookings(&self, batch: &[CreateBookingDto]) -> SyncResult<CreateAck>;

    /// `PUT /Booking/checkout` for one record.
    async fn checkout(&self, request: &CheckoutRequest) -> SyncResult<()>;

    /// `GET /Settings/hall-types/{admin_id}`.
    async fn fetch_settings(&self, admin_id: &str) -> SyncResult<HallTypesResponse>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `reqwest`-backed [`BookingRemote`].
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpRemote {
    /// Builds a client whose every request carries `timeout`.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> SyncResult<Self> {
        let parsed = url::Url::parse(base_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SyncError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpRemote {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Builds the client from the `[remote]` config section.
    pub fn from_config(config: &crate::SyncConfig) -> SyncResult<Self> {
        Self::new(
            &config.remote.base_url,
            config.request_timeout(),
            &config.remote.user_agent,
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> SyncError {
        SyncError::from(err).with_timeout_secs(self.timeout_secs)
    }

    async fn rejection(response: reqwest::Response) -> SyncError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, body = %body, "Remote rejected request");
        SyncError::Rejected { status, body }
    }
}

#[async_trait]
impl BookingRemote for HttpRemote {
    async fn create_bookings(&self, batch: &[CreateBookingDto]) -> SyncResult<CreateAck> {
        let response = self
            .client
            .post(self.endpoint("Booking/create"))
            .json(batch)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            debug!(count = batch.len(), "Remote already has these bookings");
            return Ok(CreateAck::AlreadyExists);
        }
        if !status.is_success() {
            return Err(Self::rejection(response).await);
        }

        debug!(count = batch.len(), status = status.as_u16(), "Bulk create accepted");
        Ok(CreateAck::Accepted)
    }

    async fn checkout(&self, request: &CheckoutRequest) -> SyncResult<()> {
        let response = self
            .client
            .put(self.endpoint("Booking/checkout"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        debug!(booking_id = %request.booking_id, "Checkout accepted");
        Ok(())
    }

    async fn fetch_settings(&self, admin_id: &str) -> SyncResult<HallTypesResponse> {
        let response = self
            .client
            .get(self.endpoint(&format!("Settings/hall-types/{}", admin_id)))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(admin_id = %admin_id, error = %e, "Settings response did not decode");
            SyncError::MalformedResponse(e.to_string())
        })
    }
}
