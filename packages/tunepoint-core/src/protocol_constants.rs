//! Protocol constants shared by discovery and the device clients.
//!
//! Ports, timeouts and fixed paths for both device families live here so the
//! probe code and the control clients cannot drift apart.

// ─────────────────────────────────────────────────────────────────────────────
// Ports
// ─────────────────────────────────────────────────────────────────────────────

/// BluOS HTTP control port.
pub const BLUOS_PORT: u16 = 11000;

/// Sonos UPnP control port.
pub const SONOS_PORT: u16 = 1400;

// ─────────────────────────────────────────────────────────────────────────────
// Timeouts
// ─────────────────────────────────────────────────────────────────────────────

/// Per-probe timeout during a subnet scan (milliseconds).
///
/// Bounds the total scan time: every probe runs concurrently, so the scan
/// finishes roughly one timeout after the last task was spawned.
pub const PROBE_TIMEOUT_MS: u64 = 3000;

/// Timeout for a single control request (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// BluOS endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Identity document used to recognise a BluOS player.
pub const BLUOS_SYNC_STATUS_PATH: &str = "/SyncStatus";

/// Endpoints tried in order when forcing a BluOS player back to standalone.
pub const BLUOS_RESET_PATHS: &[&str] = &["/Standalone", "/Reset", "/ClearSlaves"];

/// Endpoints exercised by the BluOS self-test.
pub const BLUOS_DIAGNOSTIC_PATHS: &[&str] = &["/Status", "/SyncStatus", "/Presets", "/Slaves"];

// ─────────────────────────────────────────────────────────────────────────────
// Sonos endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// UPnP device description served by every Sonos player.
pub const SONOS_DEVICE_DESCRIPTION_PATH: &str = "/xml/device_description.xml";

/// Tokens whose presence in the device description identifies a Sonos player.
pub const SONOS_SIGNATURE_TOKENS: &[&str] = &["Sonos", "RINCON"];

/// Content-directory containers browsed for radio favorites, in priority order.
pub const DEFAULT_FAVORITES_ROOTS: &[&str] = &["R:0/0", "R:0/1", "FV:2", "A:RADIO", "SQ:"];

/// Number of children requested per Browse call.
pub const DEFAULT_BROWSE_PAGE_SIZE: u32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Favorites
// ─────────────────────────────────────────────────────────────────────────────

/// Name prefix marking a synthesized, non-playable informational preset.
pub const INFO_PRESET_MARKER: &str = "[INFO]";

/// Longest friendly name accepted from a Sonos device description.
pub const MAX_FRIENDLY_NAME_LEN: usize = 50;
