//! Membership Registry
//!
//! Process-wide mapping of room → connected participants. Owned by a single
//! actor task; connection handlers talk to it through a `RegistryHandle`.

mod actor;
mod rooms;

pub use actor::{MembershipRegistry, Outbound, RegistryError, RegistryHandle, RegistryStats};
pub use rooms::{Departure, JoinOutcome, Participant, Rooms, TransportId};
