use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Point-in-time copy of the traffic counters for one capture session.
///
/// Counters only grow while a session is running; they are replaced wholesale
/// (with a fresh `session_id`) when a new session becomes active. Consumers use
/// the `session_id` to discard events left over from a previous session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// Identifies the capture session these counters belong to
    pub session_id: Uuid,

    /// Interface the session is bound to
    pub interface: Option<String>,

    /// Total number of packets observed
    pub total_packets: u64,

    /// Total bytes observed
    pub total_bytes: u64,

    /// Packets per protocol label
    pub protocols: HashMap<String, u64>,

    /// Capture start time
    pub start_time: Option<DateTime<Utc>>,

    /// Packet rate (packets per second)
    pub packet_rate: f64,

    /// Data rate (bytes per second)
    pub data_rate: f64,

    /// Read errors reported by the capture handle
    pub errors: u64,
}

impl TrafficSnapshot {
    /// Zeroed counters for a session that has just become active.
    pub fn for_session(session_id: Uuid, interface: &str) -> Self {
        Self {
            session_id,
            interface: Some(interface.to_string()),
            start_time: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Account one observed packet.
    pub fn record_packet(&mut self, bytes: usize, protocol: &str) {
        self.total_packets += 1;
        self.total_bytes += bytes as u64;
        *self.protocols.entry(protocol.to_string()).or_insert(0) += 1;
        self.refresh_rates();
    }

    /// Account one failed read.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    fn refresh_rates(&mut self) {
        let Some(start) = self.start_time else {
            return;
        };
        let elapsed = Utc::now().signed_duration_since(start);
        let secs = elapsed.num_milliseconds() as f64 / 1000.0;
        if secs > 0.0 {
            self.packet_rate = self.total_packets as f64 / secs;
            self.data_rate = self.total_bytes as f64 / secs;
        }
    }
}

impl Default for TrafficSnapshot {
    fn default() -> Self {
        Self {
            session_id: Uuid::nil(),
            interface: None,
            total_packets: 0,
            total_bytes: 0,
            protocols: HashMap::new(),
            start_time: None,
            packet_rate: 0.0,
            data_rate: 0.0,
            errors: 0,
        }
    }
}
