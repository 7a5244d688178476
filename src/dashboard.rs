// Dashboard front end: a status line, an append-only output log and a
// panel of buttons. Each button asks for the input it needs and makes the
// same wrapper calls as the shell. The dashboard also keeps the listing of
// the messages it last showed, so downloads and deletions only accept ids
// the user has seen. `window` draws it.

use anyhow::Result;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::attachments::{message_dir, save_message_attachments};
use crate::client::ImapClient;
use crate::config::Settings;
use crate::listing::{parse_ids, Entry, Listing, Summary};
use crate::mailbox::Connector;
use crate::ui::{self, Prompt};

pub const TITLE: &str = "IMAP Client";

/// The button panel, top to bottom.
pub const BUTTONS: &[&str] = &[
    "Connect",
    "Login",
    "List Folders",
    "Select Folder",
    "List Emails",
    "Download Attachments",
    "Delete Emails",
    "Upload Email",
    "Logout",
    "Quit",
];

const DISCONNECTED: &str = "Status: Disconnected";

// The output pane shows plain text.
fn failure(out: &mut dyn Write, action: &str, err: &dyn Display) -> io::Result<()> {
    ui::report_failure(out, false, action, err)
}

pub struct Dashboard<P: Prompt, W: Write> {
    prompt: P,
    out: W,
    settings: Settings,
    connector: Box<dyn Connector>,
    client: Option<ImapClient>,
    listing: Listing,
    status: String,
}

impl<P: Prompt, W: Write> Dashboard<P, W> {
    pub fn new(prompt: P, out: W, settings: Settings, connector: Box<dyn Connector>) -> Self {
        Dashboard {
            prompt,
            out,
            settings,
            connector,
            client: None,
            listing: Listing::new(),
            status: DISCONNECTED.to_string(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Whether pressing `button` now would ask the user anything. Buttons
    /// that are not ready just print why.
    pub fn asks_for_input(&self, button: &str) -> bool {
        match button {
            "Connect" => true,
            "Login" | "Select Folder" | "Upload Email" => self.client.is_some(),
            "Download Attachments" | "Delete Emails" => self.client.is_some() && !self.listing.is_empty(),
            _ => false,
        }
    }

    /// Run the handler behind one button.
    pub fn press(&mut self, button: &str) -> Result<()> {
        debug!(button, "dashboard action");
        match button {
            "Connect" => self.connect(),
            "Login" => self.login(),
            "List Folders" => self.list_folders(),
            "Select Folder" => self.select_folder(),
            "List Emails" => self.list_emails(),
            "Download Attachments" => self.download_attachments(),
            "Delete Emails" => self.delete_emails(),
            "Upload Email" => self.upload(),
            "Logout" => self.logout(),
            "Quit" => self.quit(),
            _ => Ok(()),
        }
    }

    /// Log out if a session is still open.
    pub fn quit(&mut self) -> Result<()> {
        if self.client.is_some() {
            self.logout()?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let endpoint = ui::ask_endpoint(&mut self.prompt, &self.settings)?;
        if let Some(mut old) = self.client.take() {
            if let Err(e) = old.logout() {
                debug!("dropping previous session: {}", e);
            }
        }
        self.listing.clear();
        self.status = DISCONNECTED.to_string();

        let spinner = ui::spinner("Connecting...");
        let server = endpoint.server.clone();
        let result = ImapClient::connect(self.connector.as_ref(), endpoint, self.settings.fetch_limit);
        spinner.finish_and_clear();

        match result {
            Ok(client) => {
                self.client = Some(client);
                self.status = format!("Status: Connected to {}", server);
                writeln!(self.out, "Connected successfully!")?;
            }
            Err(e) => failure(&mut self.out, "Connection", &e)?,
        }
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        let username = self.prompt.text("Enter username", self.settings.username.as_deref())?;
        let password = self.prompt.password("Enter password")?;
        match client.login(username.trim(), &password) {
            Ok(()) => {
                self.status = format!("Status: Logged in to {} as {}", client.endpoint().server, username.trim());
                writeln!(self.out, "Logged in successfully!")?;
            }
            Err(e) => failure(&mut self.out, "Login", &e)?,
        }
        Ok(())
    }

    fn list_folders(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        writeln!(self.out, "Fetching folders...")?;
        match client.list_folders() {
            Ok(folders) if folders.is_empty() => writeln!(self.out, "No folders found.")?,
            Ok(folders) => {
                writeln!(self.out, "Available Folders:")?;
                for folder in folders {
                    writeln!(self.out, "- {}", folder)?;
                }
            }
            Err(e) => failure(&mut self.out, "Listing folders", &e)?,
        }
        Ok(())
    }

    fn select_folder(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        let folder = self.prompt.text("Enter folder name", None)?;
        match client.select_folder(&folder) {
            Ok(()) => {
                // Ids from another folder mean nothing here.
                self.listing.clear();
                writeln!(self.out, "Selected folder: {}", folder)?;
            }
            Err(e) => failure(&mut self.out, &format!("Selecting folder '{}'", folder), &e)?,
        }
        Ok(())
    }

    fn list_emails(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        writeln!(self.out, "Fetching emails...")?;
        self.listing.clear();

        let spinner = ui::spinner("Fetching messages...");
        let result = client.fetch_emails();
        spinner.finish_and_clear();

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                failure(&mut self.out, "Fetching messages", &e)?;
                return Ok(());
            }
        };
        if fetched.is_empty() {
            writeln!(self.out, "No messages found.")?;
            return Ok(());
        }

        writeln!(self.out, "Available Messages:")?;
        for (id, outcome) in fetched {
            let view = match outcome {
                Ok(view) => view,
                Err(e) => {
                    failure(&mut self.out, &format!("Fetching message {}", id), &e)?;
                    continue;
                }
            };
            let summary = Summary {
                sender: view.sender.unwrap_or_else(|| "Unknown Sender".into()),
                subject: view.subject.unwrap_or_else(|| "No Subject".into()),
                date: view.date.unwrap_or_else(|| "Unknown Date".into()),
            };
            writeln!(self.out, "{}", Entry(id, &summary))?;
            self.listing.insert(id, summary);
        }
        Ok(())
    }

    fn download_attachments(&mut self) -> Result<()> {
        let client = match self.client.as_mut() {
            Some(client) if !self.listing.is_empty() => client,
            _ => {
                writeln!(self.out, "List emails first to view message IDs.")?;
                return Ok(());
            }
        };
        let id = self.prompt.number("Enter message ID to download attachments")?;
        if !self.listing.contains(id) {
            writeln!(self.out, "Invalid message ID!")?;
            return Ok(());
        }

        let view = match client.fetch_message(id) {
            Ok(Some(view)) => view,
            Ok(None) => {
                writeln!(self.out, "Failed to fetch message {}.", id)?;
                return Ok(());
            }
            Err(e) => {
                failure(&mut self.out, &format!("Fetching message {}", id), &e)?;
                return Ok(());
            }
        };
        if view.attachments.is_empty() {
            writeln!(self.out, "No attachments in message {}.", id)?;
            return Ok(());
        }

        let base = self.attachments_root();
        match save_message_attachments(&base, id, &view.attachments) {
            Ok(saved) => {
                ui::write_saved(&mut self.out, false, &saved)?;
                writeln!(self.out, "Attachments downloaded to {}", message_dir(&base, id).display())?;
            }
            Err(e) => failure(&mut self.out, "Creating attachments directory", &e)?,
        }
        Ok(())
    }

    // Relative attachment directories are anchored at the working directory
    // so the reported path is absolute.
    fn attachments_root(&self) -> PathBuf {
        let dir = &self.settings.attachments_dir;
        if dir.is_absolute() {
            return dir.clone();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(dir),
            Err(_) => dir.clone(),
        }
    }

    fn delete_emails(&mut self) -> Result<()> {
        let client = match self.client.as_mut() {
            Some(client) if !self.listing.is_empty() => client,
            _ => {
                writeln!(self.out, "List emails first to view message IDs.")?;
                return Ok(());
            }
        };
        let input = self
            .prompt
            .text("Enter message IDs to delete (comma-separated)", None)?;
        let valid = self.listing.known(&parse_ids(&input));
        if valid.is_empty() {
            writeln!(self.out, "No valid message IDs provided.")?;
            return Ok(());
        }

        let question = format!("Are you sure you want to delete {} message(s)?", valid.len());
        if !self.prompt.confirm(&question, false)? {
            return Ok(());
        }
        match client.delete_messages(&valid) {
            Ok(n) => {
                writeln!(self.out, "Deleted {} message(s).", n)?;
                self.listing.remove_all(&valid);
            }
            Err(e) => failure(&mut self.out, "Deleting messages", &e)?,
        }
        Ok(())
    }

    fn upload(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        let draft = ui::ask_draft(&mut self.prompt, &self.settings)?;
        match client.upload(&draft) {
            Ok(()) => writeln!(self.out, "Email uploaded to folder '{}' successfully!", draft.folder)?,
            Err(e) => failure(&mut self.out, "Upload", &e)?,
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        let Some(mut client) = self.client.take() else {
            writeln!(self.out, "Not connected!")?;
            return Ok(());
        };
        if let Err(e) = client.logout() {
            failure(&mut self.out, "Logout", &e)?;
        }
        self.listing.clear();
        self.status = DISCONNECTED.to_string();
        writeln!(self.out, "Logged out.")?;
        Ok(())
    }
}

impl<P: Prompt, W: Write + Default> Dashboard<P, W> {
    /// Hand over everything written since the last call.
    pub fn take_output(&mut self) -> W {
        std::mem::take(&mut self.out)
    }
}
