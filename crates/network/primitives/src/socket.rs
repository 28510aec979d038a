use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// The outbound half of a connection as seen by a protocol state machine.
///
/// Writing is fire-and-forget: a state machine hands over a complete frame
/// and moves on. Delivery failures surface on the transport that owns the
/// connection, not here.
pub trait PacketWriter {
    fn write(&mut self, frame: Bytes);
}

impl<W: PacketWriter + ?Sized> PacketWriter for &mut W {
    fn write(&mut self, frame: Bytes) {
        (**self).write(frame);
    }
}

impl PacketWriter for Vec<Bytes> {
    fn write(&mut self, frame: Bytes) {
        self.push(frame);
    }
}

impl PacketWriter for VecDeque<Bytes> {
    fn write(&mut self, frame: Bytes) {
        self.push_back(frame);
    }
}

/// Hands frames to a dedicated writer task.
impl PacketWriter for UnboundedSender<Bytes> {
    fn write(&mut self, frame: Bytes) {
        if self.send(frame).is_err() {
            trace!("writer task gone, dropping outbound frame");
        }
    }
}
