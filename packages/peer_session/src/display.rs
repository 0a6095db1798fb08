use room_protocol::PeerId;

use crate::media::{LocalStream, RemoteStream};

/// Where streams are rendered: the `#video-grid` of the room page.
///
/// A surface belongs to exactly one session, which hands it back through
/// [`VideoGrid::remove`] when it closes.
pub trait VideoGrid: Send + Sync + 'static {
    type Surface: Send + 'static;

    /// Muted preview of our own capture.
    fn show_local(&self, stream: &LocalStream);

    /// Placeholder tile for `peer`, shown before any media arrives.
    fn create_surface(&self, peer: &PeerId) -> Self::Surface;

    fn attach(&self, surface: &mut Self::Surface, stream: RemoteStream);

    fn remove(&self, surface: Self::Surface);
}
