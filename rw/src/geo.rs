//! Geolocation boundary
//!
//! A [`Geolocator`] either yields coordinates or one of four classified
//! failures. Failures are shown to the user; they never change the flow.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{LocationConfig, LocatorKind};
use crate::domain::GeoLocation;

/// Why a position could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeoError {
    /// Text for the notice line
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => "Location access was denied. Local services need a location.".to_string(),
            Self::PositionUnavailable(_) => "Your position could not be determined. Try again later.".to_string(),
            Self::Timeout => "Finding your location took too long. Try again.".to_string(),
            Self::Unsupported => {
                "Geolocation is not available. Pass --lat/--lon or set location.provider: fixed.".to_string()
            }
        }
    }
}

/// Source of the user's position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<GeoLocation, GeoError>;
}

/// Always answers with the same coordinates
pub struct FixedLocator {
    location: GeoLocation,
}

impl FixedLocator {
    pub fn new(location: GeoLocation) -> Self {
        Self { location }
    }
}

#[async_trait]
impl Geolocator for FixedLocator {
    async fn locate(&self) -> Result<GeoLocation, GeoError> {
        debug!(location = %self.location, "FixedLocator::locate: called");
        Ok(self.location)
    }
}

/// Geolocation is switched off
pub struct NoLocator;

#[async_trait]
impl Geolocator for NoLocator {
    async fn locate(&self) -> Result<GeoLocation, GeoError> {
        debug!("NoLocator::locate: called");
        Err(GeoError::Unsupported)
    }
}

/// Approximate position of the public IP address
///
/// Speaks the ip-api.com JSON format.
pub struct IpLocator {
    url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoError::PositionUnavailable(e.to_string()))?;
        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpLocator {
    async fn locate(&self) -> Result<GeoLocation, GeoError> {
        debug!(url = %self.url, "IpLocator::locate: called");
        let response = self.http.get(&self.url).send().await.map_err(classify_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GeoError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GeoError::PositionUnavailable(format!("HTTP {}", status)));
        }

        let reply: IpLookupReply = response.json().await.map_err(classify_transport)?;
        parse_reply(reply)
    }
}

fn classify_transport(err: reqwest::Error) -> GeoError {
    if err.is_timeout() {
        GeoError::Timeout
    } else {
        GeoError::PositionUnavailable(err.to_string())
    }
}

fn parse_reply(reply: IpLookupReply) -> Result<GeoLocation, GeoError> {
    debug!(?reply, "parse_reply: called");
    if !reply.status.is_empty() && reply.status != "success" {
        let message = reply.message.unwrap_or_else(|| reply.status.clone());
        return Err(GeoError::PositionUnavailable(message));
    }
    match (reply.lat, reply.lon) {
        (Some(lat), Some(lon)) => {
            GeoLocation::new(lat, lon).map_err(|e| GeoError::PositionUnavailable(e.to_string()))
        }
        _ => Err(GeoError::PositionUnavailable("reply has no coordinates".to_string())),
    }
}

/// Create the locator for the configuration
///
/// `cli_override` coordinates win over everything in the config.
pub fn create_locator(config: &LocationConfig, cli_override: Option<GeoLocation>) -> Box<dyn Geolocator> {
    debug!(provider = ?config.provider, ?cli_override, "create_locator: called");
    if let Some(location) = cli_override {
        return Box::new(FixedLocator::new(location));
    }

    match config.provider {
        LocatorKind::Fixed => match config.fixed().map(|(lat, lon)| GeoLocation::new(lat, lon)) {
            Some(Ok(location)) => Box::new(FixedLocator::new(location)),
            Some(Err(e)) => {
                warn!(error = %e, "create_locator: invalid fixed location, geolocation disabled");
                Box::new(NoLocator)
            }
            None => {
                warn!("create_locator: fixed provider without latitude/longitude, geolocation disabled");
                Box::new(NoLocator)
            }
        },
        LocatorKind::Ip => match IpLocator::new(&config.lookup_url, Duration::from_millis(config.timeout_ms)) {
            Ok(locator) => Box::new(locator),
            Err(e) => {
                warn!(error = %e, "create_locator: could not build IP locator");
                Box::new(NoLocator)
            }
        },
        LocatorKind::None => Box::new(NoLocator),
    }
}
