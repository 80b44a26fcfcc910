//! Session identifier minting.
//!
//! Identifiers are opaque stable strings held by the client. Minting goes
//! through a capability trait so the router can be driven with predictable
//! identifiers in tests.

use uuid::Uuid;

/// Generator of fresh session identifiers.
pub trait SessionIds: Send + Sync {
    /// Mint a new globally unique identifier.
    fn mint(&self) -> String;
}

/// UUID v4 identifiers: 122 bits from the OS CSPRNG, collision probability
/// negligible for any realistic session population.
#[derive(Debug, Clone, Default)]
pub struct UuidSessionIds;

impl SessionIds for UuidSessionIds {
    fn mint(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
