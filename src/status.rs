/// Connection state of the protocol worker.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Status {
    /// No usable link; open attempts are gated by the retry interval.
    #[default]
    Disconnected,
    /// The link is open and frames are being exchanged.
    Connected,
}
