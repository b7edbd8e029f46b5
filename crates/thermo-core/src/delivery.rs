//! Delivery seam between the reporter and the network
//!
//! The reporter never talks HTTP itself. It hands a rendered payload and an
//! endpoint URL to a [`Transport`] and gets back a status-aware
//! [`DeliveryError`] on failure. Only server-side failures (5xx) are worth
//! keeping for a later retry; everything else is dropped by the reporter.

use alloc::string::String;

use thiserror::Error;

/// Why a payload did not reach the collector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The collector answered with a 5xx status
    #[error("collector returned server error {status}")]
    Server { status: u16 },
    /// The collector answered with any other non-success status
    #[error("collector rejected the payload with status {status}")]
    Rejected { status: u16 },
    /// No HTTP answer at all: refused, reset, DNS failure and the like
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Classify an HTTP status code. Success codes are not errors.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            500..=599 => Some(Self::Server { status }),
            _ => Some(Self::Rejected { status }),
        }
    }

    /// Whether this failure qualifies for the ledger and fallback path
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}

/// Where a payload is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Regular per-window reports
    Primary,
    /// Combined blobs of previously failed reports
    Fallback,
}

/// Port for delivering payloads to the remote collector
///
/// # Example Implementation
///
/// ```ignore
/// struct LoopbackTransport;
///
/// impl Transport for LoopbackTransport {
///     async fn deliver(&mut self, url: &str, payload: &str) -> Result<(), DeliveryError> {
///         log::info!("{url} <- {payload}");
///         Ok(())
///     }
/// }
/// ```
pub trait Transport {
    /// POST `payload` as `application/json` to `url`
    ///
    /// Completes once the collector has answered or the connection failed.
    /// No timeout is applied here.
    fn deliver(
        &mut self,
        url: &str,
        payload: &str,
    ) -> impl core::future::Future<Output = Result<(), DeliveryError>>;
}

impl<T: Transport> Transport for &mut T {
    fn deliver(
        &mut self,
        url: &str,
        payload: &str,
    ) -> impl core::future::Future<Output = Result<(), DeliveryError>> {
        (**self).deliver(url, payload)
    }
}
