//! Awning data model and status derivation
//!
//! The shared remote record stores two raw integer fields: the position the
//! device firmware last confirmed (`status`) and the position the operator
//! asked for (`requested_status`). The user-facing status is derived from
//! the pair: a mismatch means the awning is mid-transition in the matching
//! direction, a match means it has arrived, and anything else collapses to
//! `Stopped`.

use serde::{Deserialize, Serialize};

/// Raw three-valued position code shared with the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// Movement halted
    Stop = 0,
    /// Fully retracted position
    Close = 1,
    /// Fully extended position
    Open = 2,
}

impl StatusCode {
    /// Decode a raw wire code; unknown codes are rejected
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Stop),
            1 => Some(StatusCode::Close),
            2 => Some(StatusCode::Open),
            _ => None,
        }
    }

    /// Wire representation of this code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// User-facing awning status derived from the raw code pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwningStatus {
    /// Extending towards the open position
    Opening,
    /// Retracting towards the closed position
    Closing,
    /// Arrived at the open position
    Opened,
    /// Arrived at the closed position
    Closed,
    /// Halted, or the code pair is not a recognized combination
    Stopped,
}

impl AwningStatus {
    /// Whether the awning is mid-transition
    pub fn is_moving(self) -> bool {
        matches!(self, AwningStatus::Opening | AwningStatus::Closing)
    }
}

/// Raw shared record as stored remotely. Every field is optional on the
/// wire; partial payloads are tolerated through the defaulting rules in
/// [`derive_state`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteAwningRecord {
    /// Default movement duration in milliseconds
    pub duration: Option<u64>,

    /// Opening duration in milliseconds, falls back to `duration`
    pub opening_duration: Option<u64>,

    /// Closing duration in milliseconds, falls back to `duration`
    pub closing_duration: Option<u64>,

    /// Signal strength reported by the device, in dBm
    pub network: Option<i32>,

    /// Movement progress, 0..100
    pub progress: Option<i64>,

    /// Position requested by the operator (0=Stop, 1=Close, 2=Open)
    pub requested_status: Option<u8>,

    /// Position last confirmed by the firmware (0=Stop, 1=Close, 2=Open)
    pub status: Option<u8>,
}

/// Derived view of the shared record, replaced wholesale on every change
/// notification and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAwningState {
    /// Derived five-valued status
    pub status: AwningStatus,

    /// Movement progress, present only while Opening or Closing
    pub progress: Option<u8>,

    /// Signal quality percentage derived from dBm
    pub network_quality: u8,

    /// Default movement duration in milliseconds
    pub duration_ms: u64,

    /// Opening duration in milliseconds
    pub opening_duration_ms: u64,

    /// Closing duration in milliseconds
    pub closing_duration_ms: u64,
}

/// Map a dBm reading to a quality percentage.
///
/// Linear between -100 dBm (0%) and -50 dBm (100%), clamped outside.
pub fn signal_quality(dbm: i32) -> u8 {
    if dbm <= -100 {
        0
    } else if dbm >= -50 {
        100
    } else {
        (2 * (dbm + 100)) as u8
    }
}

/// Derive the user-facing state from a raw record.
///
/// Pure function of the record; the status column depends only on the
/// `(requested_status, status)` pair.
pub fn derive_state(record: &RemoteAwningRecord) -> DerivedAwningState {
    use StatusCode::{Close, Open};

    let requested = record.requested_status.and_then(StatusCode::from_code);
    let confirmed = record.status.and_then(StatusCode::from_code);

    let status = match (requested, confirmed) {
        (Some(Open), Some(Close)) => AwningStatus::Opening,
        (Some(Close), Some(Open)) => AwningStatus::Closing,
        (Some(Open), Some(Open)) => AwningStatus::Opened,
        (Some(Close), Some(Close)) => AwningStatus::Closed,
        _ => AwningStatus::Stopped,
    };

    // Progress is only meaningful mid-transition; a settled record may still
    // carry a stale value which must not leak through.
    let progress = if status.is_moving() {
        Some(record.progress.unwrap_or(0).clamp(0, 100) as u8)
    } else {
        None
    };

    let duration = record.duration.unwrap_or(0);

    DerivedAwningState {
        status,
        progress,
        network_quality: signal_quality(record.network.unwrap_or(0)),
        duration_ms: duration,
        opening_duration_ms: record.opening_duration.unwrap_or(duration),
        closing_duration_ms: record.closing_duration.unwrap_or(duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(requested: u8, status: u8) -> RemoteAwningRecord {
        RemoteAwningRecord {
            requested_status: Some(requested),
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn derivation_table() {
        assert_eq!(derive_state(&record(2, 1)).status, AwningStatus::Opening);
        assert_eq!(derive_state(&record(1, 2)).status, AwningStatus::Closing);
        assert_eq!(derive_state(&record(2, 2)).status, AwningStatus::Opened);
        assert_eq!(derive_state(&record(1, 1)).status, AwningStatus::Closed);
    }

    #[test]
    fn unlisted_pairs_are_stopped() {
        for (requested, status) in [
            (0u8, 0u8),
            (0, 1),
            (0, 2),
            (1, 0),
            (2, 0),
            (3, 2),
            (2, 7),
        ] {
            assert_eq!(
                derive_state(&record(requested, status)).status,
                AwningStatus::Stopped,
                "({}, {})",
                requested,
                status
            );
        }
    }

    #[test]
    fn missing_codes_are_stopped() {
        let rec = RemoteAwningRecord::default();
        assert_eq!(derive_state(&rec).status, AwningStatus::Stopped);

        let rec = RemoteAwningRecord {
            requested_status: Some(2),
            ..Default::default()
        };
        assert_eq!(derive_state(&rec).status, AwningStatus::Stopped);
    }

    #[test]
    fn progress_forwarded_only_while_moving() {
        let mut rec = record(2, 1);
        rec.progress = Some(40);
        assert_eq!(derive_state(&rec).progress, Some(40));

        // Settled and stopped records must not leak a stale value
        let mut rec = record(2, 2);
        rec.progress = Some(40);
        assert_eq!(derive_state(&rec).progress, None);

        let mut rec = record(1, 1);
        rec.progress = Some(40);
        assert_eq!(derive_state(&rec).progress, None);

        let mut rec = record(0, 0);
        rec.progress = Some(40);
        assert_eq!(derive_state(&rec).progress, None);
    }

    #[test]
    fn progress_clamped_and_defaulted() {
        let mut rec = record(1, 2);
        rec.progress = Some(150);
        assert_eq!(derive_state(&rec).progress, Some(100));

        rec.progress = Some(-5);
        assert_eq!(derive_state(&rec).progress, Some(0));

        rec.progress = None;
        assert_eq!(derive_state(&rec).progress, Some(0));
    }

    #[test]
    fn duration_fallback() {
        let rec = RemoteAwningRecord {
            duration: Some(20_000),
            ..Default::default()
        };
        let derived = derive_state(&rec);
        assert_eq!(derived.duration_ms, 20_000);
        assert_eq!(derived.opening_duration_ms, 20_000);
        assert_eq!(derived.closing_duration_ms, 20_000);

        let rec = RemoteAwningRecord {
            duration: Some(20_000),
            opening_duration: Some(18_000),
            closing_duration: Some(22_000),
            ..Default::default()
        };
        let derived = derive_state(&rec);
        assert_eq!(derived.opening_duration_ms, 18_000);
        assert_eq!(derived.closing_duration_ms, 22_000);
    }

    #[test]
    fn signal_quality_breakpoints() {
        assert_eq!(signal_quality(-100), 0);
        assert_eq!(signal_quality(-50), 100);
        assert_eq!(signal_quality(-75), 50);
    }

    #[test]
    fn signal_quality_clamped() {
        assert_eq!(signal_quality(-120), 0);
        assert_eq!(signal_quality(i32::MIN), 0);
        assert_eq!(signal_quality(-10), 100);
        assert_eq!(signal_quality(i32::MAX), 100);
    }

    #[test]
    fn status_code_round_trip() {
        assert_eq!(StatusCode::from_code(0), Some(StatusCode::Stop));
        assert_eq!(StatusCode::from_code(1), Some(StatusCode::Close));
        assert_eq!(StatusCode::from_code(2), Some(StatusCode::Open));
        assert_eq!(StatusCode::from_code(3), None);
        assert_eq!(StatusCode::Open.code(), 2);
    }

    #[test]
    fn record_tolerates_partial_payload() {
        let rec: RemoteAwningRecord =
            serde_json::from_value(serde_json::json!({"network": -72})).unwrap();
        assert_eq!(rec.network, Some(-72));
        assert_eq!(rec.duration, None);
        assert_eq!(derive_state(&rec).status, AwningStatus::Stopped);
        assert_eq!(derive_state(&rec).network_quality, 56);
    }
}
