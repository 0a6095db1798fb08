//! Server metrics for observability
//!
//! Counters for signaling connections and membership traffic.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Server-wide metrics
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    /// Currently open signaling connections
    pub active_connections: AtomicU64,
    /// Total signaling connections since server start
    pub total_connections: AtomicU64,

    // Membership metrics
    /// Accepted `join-room` events
    pub joins: AtomicU64,
    /// Duplicate `join-room` events that were ignored
    pub duplicate_joins: AtomicU64,
    /// Participants removed (explicit leave or disconnect)
    pub leaves: AtomicU64,

    // Message metrics
    /// Frames received from clients
    pub messages_received: AtomicU64,
    /// `user-connected` / `user-disconnected` events pushed to members
    pub broadcasts_sent: AtomicU64,
    /// Client frames rejected as malformed or invalid
    pub invalid_messages: AtomicU64,

    start_time: Option<Instant>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn participant_joined(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_join(&self) {
        self.duplicate_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn participant_left(&self) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn broadcasts_sent(&self, count: u64) {
        self.broadcasts_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn invalid_message(&self) {
        self.invalid_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            connections: ConnectionMetrics {
                active: self.active_connections.load(Ordering::Relaxed),
                total: self.total_connections.load(Ordering::Relaxed),
            },
            membership: MembershipMetrics {
                joins: self.joins.load(Ordering::Relaxed),
                duplicate_joins: self.duplicate_joins.load(Ordering::Relaxed),
                leaves: self.leaves.load(Ordering::Relaxed),
            },
            messages: MessageMetrics {
                received: self.messages_received.load(Ordering::Relaxed),
                broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
                invalid: self.invalid_messages.load(Ordering::Relaxed),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections: ConnectionMetrics,
    pub membership: MembershipMetrics,
    pub messages: MessageMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub active: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipMetrics {
    pub joins: u64,
    pub duplicate_joins: u64,
    pub leaves: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetrics {
    pub received: u64,
    pub broadcasts_sent: u64,
    pub invalid: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub rooms: u64,
    pub participants: u64,
    pub connections: u64,
    pub uptime_secs: u64,
}
