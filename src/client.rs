// IMAP client module: a thin, synchronous wrapper around the IMAP library.
// It holds the connection parameters and the library handle, and forwards
// each user action to one library call. Errors are returned as they come;
// the front ends decide how to print them.

use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::mailbox::{Connector, Endpoint, Login, Mailbox};
use crate::message::{Draft, MessageView};

/// Where a session is in its short life.
enum Link {
    Greeted(Box<dyn Login>),
    Authenticated(Box<dyn Mailbox>),
}

/// One session against one server. Created by `connect`, dropped after
/// `logout`.
pub struct ImapClient {
    endpoint: Endpoint,
    link: Option<Link>,
    current_folder: Option<String>,
    fetch_limit: usize,
}

impl ImapClient {
    /// Open a connection and read the server greeting.
    pub fn connect(connector: &dyn Connector, endpoint: Endpoint, fetch_limit: usize) -> Result<Self> {
        debug!(%endpoint, tls = endpoint.use_tls, "connecting");
        let login = connector.connect(&endpoint).map_err(|e| {
            warn!(%endpoint, "connection failed: {}", e);
            e
        })?;
        Ok(ImapClient {
            endpoint,
            link: Some(Link::Greeted(login)),
            current_folder: None,
            fetch_limit,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.link, Some(Link::Authenticated(_)))
    }

    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    /// Authenticate. A rejected login leaves the connection open so the
    /// user can try again.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        match self.link.take() {
            None => Err(ClientError::NotConnected),
            Some(Link::Authenticated(mailbox)) => {
                self.link = Some(Link::Authenticated(mailbox));
                Err(ClientError::AlreadyLoggedIn)
            }
            Some(Link::Greeted(login)) => {
                debug!(username, "logging in");
                match login.login(username, password) {
                    Ok(mailbox) => {
                        self.link = Some(Link::Authenticated(mailbox));
                        Ok(())
                    }
                    Err((e, login)) => {
                        warn!(username, "login failed: {}", e);
                        self.link = Some(Link::Greeted(login));
                        Err(e)
                    }
                }
            }
        }
    }

    fn mailbox(&mut self) -> Result<&mut dyn Mailbox> {
        match self.link.as_mut() {
            None => Err(ClientError::NotConnected),
            Some(Link::Greeted(_)) => Err(ClientError::NotLoggedIn),
            Some(Link::Authenticated(mailbox)) => Ok(mailbox.as_mut()),
        }
    }

    fn selected_mailbox(&mut self) -> Result<&mut dyn Mailbox> {
        if self.current_folder.is_none() {
            // Report a missing session before a missing folder.
            self.mailbox()?;
            return Err(ClientError::NoFolderSelected);
        }
        self.mailbox()
    }

    pub fn list_folders(&mut self) -> Result<Vec<String>> {
        debug!("listing folders");
        self.mailbox()?.list_folders()
    }

    /// Select a folder; the current folder only changes on success.
    pub fn select_folder(&mut self, folder: &str) -> Result<()> {
        debug!(folder, "selecting folder");
        self.mailbox()?.select(folder)?;
        self.current_folder = Some(folder.to_string());
        Ok(())
    }

    /// Ids of the newest `fetch_limit` messages in the selected folder,
    /// oldest first.
    pub fn fetch_message_ids(&mut self) -> Result<Vec<u32>> {
        let limit = self.fetch_limit;
        let mut ids = self.selected_mailbox()?.search_all()?;
        ids.sort_unstable();
        if ids.len() > limit {
            ids.drain(..ids.len() - limit);
        }
        debug!(count = ids.len(), "message ids");
        Ok(ids)
    }

    /// Fetch and decode one message. `None` when the server returned no
    /// data for the id.
    pub fn fetch_message(&mut self, id: u32) -> Result<Option<MessageView>> {
        debug!(id, "fetching message");
        match self.selected_mailbox()?.fetch_raw(id)? {
            Some(raw) => Ok(Some(MessageView::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Fetch the newest messages. Ids the server has no data for are logged
    /// and left out. Any other failure is kept next to its id so the caller
    /// can report it and go on; only the session and folder checks end the
    /// whole fetch.
    pub fn fetch_emails(&mut self) -> Result<Vec<(u32, Result<MessageView>)>> {
        let ids = self.fetch_message_ids()?;
        let mut fetched = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch_message(id) {
                Ok(Some(view)) => fetched.push((id, Ok(view))),
                Ok(None) => warn!(id, "no data found for message"),
                Err(e) if e.is_guard() => return Err(e),
                Err(e) => {
                    warn!(id, "fetching message failed: {}", e);
                    fetched.push((id, Err(e)));
                }
            }
        }
        Ok(fetched)
    }

    /// Flag the messages deleted and expunge the selected folder.
    pub fn delete_messages(&mut self, ids: &[u32]) -> Result<usize> {
        if ids.is_empty() {
            return Err(ClientError::NoMessageIds);
        }
        debug!(?ids, "deleting messages");
        self.selected_mailbox()?.delete(ids)?;
        Ok(ids.len())
    }

    /// Compose the draft and append it to its folder.
    pub fn upload(&mut self, draft: &Draft) -> Result<()> {
        let mailbox = self.mailbox()?;
        let message = draft.compose()?;
        debug!(folder = %draft.folder, bytes = message.len(), "appending message");
        mailbox.append(&draft.folder, &message)
    }

    /// Log out. The connection is gone afterwards even if the server
    /// rejected the LOGOUT.
    pub fn logout(&mut self) -> Result<()> {
        self.current_folder = None;
        match self.link.take() {
            None => Err(ClientError::NotConnected),
            // Nothing to say to a server we never authenticated with.
            Some(Link::Greeted(_)) => Ok(()),
            Some(Link::Authenticated(mut mailbox)) => {
                debug!(endpoint = %self.endpoint, "logging out");
                mailbox.logout()
            }
        }
    }
}
