/// Errors that can occur in bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Packet encoding or outbound write failed.
    ///
    /// Sink write and flush failures arrive here as
    /// `Frame(FrameError::Io(_))`, not as [`BusError::Io`].
    #[error("frame error: {0}")]
    Frame(#[from] esplink_frame::FrameError),

    /// Reading from the inbound byte source failed (`Gateway::pump`).
    /// Outbound I/O never uses this variant.
    #[error("inbound I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;
