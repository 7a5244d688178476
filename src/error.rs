// Error type for everything that goes through the IMAP wrapper. The front
// ends never recover from these: they print the message and abandon the
// command, so the variants only need to say what went wrong.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected, use 'connect' first")]
    NotConnected,

    #[error("not logged in, use 'login' first")]
    NotLoggedIn,

    #[error("already logged in")]
    AlreadyLoggedIn,

    #[error("no folder selected, use 'select' to choose a folder")]
    NoFolderSelected,

    #[error("no message ids given")]
    NoMessageIds,

    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    #[error(transparent)]
    Imap(#[from] imap::error::Error),

    #[error("could not parse message: {0}")]
    Parse(#[from] mailparse::MailParseError),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not compose message: {0}")]
    Compose(#[from] lettre::error::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Raised by the session and folder checks, before anything reaches
    /// the server.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            ClientError::NotConnected | ClientError::NotLoggedIn | ClientError::NoFolderSelected
        )
    }
}
