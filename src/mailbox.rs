//! The narrow surface of the IMAP library the wrapper talks to.
//!
//! `Connector` opens a greeted connection, `Login` turns it into an
//! authenticated `Mailbox`. The real implementations sit on top of the
//! blocking `imap` crate; tests substitute an in-memory mailbox.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use native_tls::{TlsConnector, TlsStream};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Where to connect: the connection parameters of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.server, self.port)
    }
}

/// Opens connections to an IMAP server.
pub trait Connector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Login>>;
}

/// A greeted, not yet authenticated connection.
pub trait Login {
    /// On failure the connection is handed back so login can be retried.
    fn login(
        self: Box<Self>,
        username: &str,
        password: &str,
    ) -> std::result::Result<Box<dyn Mailbox>, (ClientError, Box<dyn Login>)>;
}

/// An authenticated session. Message ids are sequence numbers within the
/// selected folder.
pub trait Mailbox {
    fn list_folders(&mut self) -> Result<Vec<String>>;
    fn select(&mut self, folder: &str) -> Result<()>;
    fn search_all(&mut self) -> Result<Vec<u32>>;
    /// Raw RFC 822 bytes, `None` when the server has nothing for the id.
    fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>>;
    /// Flags the messages `\Deleted` and expunges the folder.
    fn delete(&mut self, ids: &[u32]) -> Result<()>;
    fn append(&mut self, folder: &str, message: &[u8]) -> Result<()>;
    fn logout(&mut self) -> Result<()>;
}

/// Transport under the IMAP client: plain TCP or TLS over TCP.
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

/// Connects over the network with the `imap` crate.
pub struct ImapConnector {
    timeout: Duration,
}

impl ImapConnector {
    pub fn new(timeout: Duration) -> Self {
        ImapConnector { timeout }
    }

    fn open_tcp(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let addrs = (endpoint.server.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| ClientError::Resolve(format!("{}: {}", endpoint, e)))?;

        let mut last_err = None;
        for addr in addrs {
            debug!(%addr, "opening tcp connection");
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(tcp) => {
                    tcp.set_read_timeout(Some(self.timeout))?;
                    tcp.set_write_timeout(Some(self.timeout))?;
                    return Ok(tcp);
                }
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) => Err(e.into()),
            None => Err(ClientError::Resolve(endpoint.to_string())),
        }
    }
}

impl Connector for ImapConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Login>> {
        let tcp = self.open_tcp(endpoint)?;
        let stream = if endpoint.use_tls {
            let tls = TlsConnector::new()?;
            let tls_stream = tls
                .connect(&endpoint.server, tcp)
                .map_err(|e| ClientError::Handshake(e.to_string()))?;
            Stream::Tls(Box::new(tls_stream))
        } else {
            Stream::Plain(tcp)
        };

        let mut client = imap::Client::new(stream);
        client.read_greeting()?;
        Ok(Box::new(ImapLogin { client }))
    }
}

struct ImapLogin {
    client: imap::Client<Stream>,
}

impl Login for ImapLogin {
    fn login(
        self: Box<Self>,
        username: &str,
        password: &str,
    ) -> std::result::Result<Box<dyn Mailbox>, (ClientError, Box<dyn Login>)> {
        match self.client.login(username, password) {
            Ok(session) => Ok(Box::new(ImapMailbox { session })),
            Err((e, client)) => {
                let retry: Box<dyn Login> = Box::new(ImapLogin { client });
                Err((e.into(), retry))
            }
        }
    }
}

struct ImapMailbox {
    session: imap::Session<Stream>,
}

/// Renders ids as an IMAP sequence set, e.g. `3,5,9`.
pub fn sequence_set(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Mailbox for ImapMailbox {
    fn list_folders(&mut self) -> Result<Vec<String>> {
        let names = self.session.list(Some(""), Some("*"))?;
        Ok(names.iter().map(|n| n.name().to_string()).collect())
    }

    fn select(&mut self, folder: &str) -> Result<()> {
        self.session.select(folder)?;
        Ok(())
    }

    fn search_all(&mut self) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.session.search("ALL")?.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let fetches = self.session.fetch(id.to_string(), "RFC822")?;
        let raw = fetches
            .iter()
            .find(|f| f.message == id)
            .and_then(|f| f.body())
            .map(|body| body.to_vec());
        Ok(raw)
    }

    fn delete(&mut self, ids: &[u32]) -> Result<()> {
        self.session
            .store(sequence_set(ids), "+FLAGS (\\Deleted)")?;
        self.session.expunge()?;
        Ok(())
    }

    fn append(&mut self, folder: &str, message: &[u8]) -> Result<()> {
        self.session.append(folder, message)?;
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        Ok(())
    }
}
