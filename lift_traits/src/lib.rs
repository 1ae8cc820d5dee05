pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error returned across trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for broadcast items (snapshots, status lines, ...).
///
/// Delivery is best-effort: a sink that fails is reported by the caller and
/// must not affect delivery to other sinks.
pub trait SnapshotSink<T>: Send {
    fn deliver(&mut self, item: &T) -> Result<(), BoxError>;

    /// A closed sink is dropped by the broadcaster on the next delivery.
    fn is_closed(&self) -> bool {
        false
    }
}
