//! Centralized error types for the Tunepoint core library.
//!
//! This module provides a unified error handling system that:
//! - Defines the per-call [`DeviceError`] taxonomy using `thiserror`
//! - Classifies errors as transport, parse, validation or capability failures
//! - Gives every library error a stable machine-readable code via [`ErrorCode`]

use thiserror::Error;

use crate::device::sonos::soap::SoapError;
use crate::discovery::DiscoveryError;
use crate::types::DeviceFamily;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::InterfaceEnumeration(_) => "interface_enumeration_failed",
            Self::Client(_) => "http_client_failed",
            Self::NoInterfaces => "no_network_interfaces",
            Self::NoDevices => "no_devices_found",
        }
    }
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::Parse => "soap_parse_error",
        }
    }
}

/// Errors returned by a single device-control operation.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// HTTP request to the device failed (timeout, connection refused, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device answered with a non-success HTTP status.
    #[error("device returned HTTP {0}")]
    HttpStatus(u16),

    /// SOAP call to the device failed.
    #[error("SOAP call failed: {0}")]
    Soap(#[from] SoapError),

    /// Device returned a document that could not be parsed.
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// Which document was being parsed.
        what: &'static str,
        /// Parser message.
        reason: String,
    },

    /// Volume outside 0..=100.
    #[error("volume must be between 0 and 100 (got {0})")]
    InvalidVolume(i32),

    /// Group specification is not of the form `<master>+<slave>`.
    #[error("invalid group specification: {0}")]
    InvalidGroupSpec(String),

    /// Master and slave refer to the same device.
    #[error("cannot group device {0} with itself")]
    SelfGrouping(usize),

    /// Ordinal does not refer to a device in the current discovery result.
    #[error("device {ordinal} is out of range (1..={count})")]
    DeviceIndexOutOfRange {
        /// Requested 1-based ordinal.
        ordinal: usize,
        /// Number of known devices.
        count: usize,
    },

    /// No preset with this id.
    #[error("preset {0} not found")]
    PresetNotFound(u32),

    /// Preset exists but cannot be played (informational entry or empty URI).
    #[error("preset {id} is not playable: {reason}")]
    PresetNotPlayable {
        /// Preset id.
        id: u32,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Operation is not offered by this device family.
    #[error("{operation} is not supported by {family} devices")]
    Unsupported {
        /// Contract operation name.
        operation: &'static str,
        /// Family of the session that rejected it.
        family: DeviceFamily,
    },

    /// Grouping requested for a device that is not a BluOS player.
    #[error("grouping is only supported between BluOS devices")]
    GroupingRequiresRest,

    /// No device has been selected in the control session.
    #[error("no active device")]
    NoActiveDevice,
}

/// Convenient Result alias for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

pub use crate::device::sonos::soap::SoapResult;
pub use crate::discovery::DiscoveryResult;

impl DeviceError {
    /// Builds a parse error for the named document.
    pub(crate) fn parse(what: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            what,
            reason: reason.to_string(),
        }
    }

    /// Builds a capability error.
    pub(crate) fn unsupported(operation: &'static str, family: DeviceFamily) -> Self {
        Self::Unsupported { operation, family }
    }

    /// True if the device could not be reached or rejected the request.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(_) | Self::HttpStatus(_) => true,
            Self::Soap(e) => !matches!(e, SoapError::Parse),
            _ => false,
        }
    }

    /// True if the device answered with a document we could not understand.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Soap(SoapError::Parse))
    }

    /// True if the request was rejected locally before any network call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidVolume(_)
                | Self::InvalidGroupSpec(_)
                | Self::SelfGrouping(_)
                | Self::DeviceIndexOutOfRange { .. }
                | Self::PresetNotFound(_)
                | Self::PresetNotPlayable { .. }
        )
    }

    /// True if the device family can never perform the operation.
    #[must_use]
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::GroupingRequiresRest)
    }

    /// HTTP status carried by the error, when the device sent one.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(status) | Self::Soap(SoapError::HttpStatus(status, _)) => {
                Some(*status)
            }
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl ErrorCode for DeviceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_) => "http_error_status",
            Self::Soap(e) => e.code(),
            Self::Parse { .. } => "parse_error",
            Self::InvalidVolume(_) => "invalid_volume",
            Self::InvalidGroupSpec(_) => "invalid_group_spec",
            Self::SelfGrouping(_) => "self_grouping",
            Self::DeviceIndexOutOfRange { .. } => "device_out_of_range",
            Self::PresetNotFound(_) => "preset_not_found",
            Self::PresetNotPlayable { .. } => "preset_not_playable",
            Self::Unsupported { .. } => "unsupported_operation",
            Self::GroupingRequiresRest => "grouping_requires_bluos",
            Self::NoActiveDevice => "no_active_device",
        }
    }
}
