//! What a connection's read side can produce.

/// One outcome of reading from a connection.
///
/// Peer disconnects are an ordinary variant, not an error path, so the
/// read loop has a single cleanup branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A text frame.
    Text(String),
    /// The peer closed the connection.
    Closed,
    /// The socket failed; the connection is unusable.
    Error(String),
}
