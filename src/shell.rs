// Line-oriented command shell. Each command prompts for whatever it needs,
// makes one wrapper call and prints the outcome; failures end the command,
// never the shell.

use anyhow::Result;
use std::io::Write;
use tracing::debug;

use crate::attachments::{message_dir, save_attachments, save_message_attachments};
use crate::client::ImapClient;
use crate::config::Settings;
use crate::listing::parse_ids;
use crate::mailbox::Connector;
use crate::ui::{self, Prompt};

pub const INTRO: &str = "Welcome to the IMAP client shell. Type help or ? to list commands.";
pub const PROMPT: &str = "(IMAP) ";

const NOT_CONNECTED: &str = "Not connected. Use 'connect' first.";
const NOT_READY: &str = "Not connected. Use 'connect' and 'login' first.";

/// A parsed shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Login,
    List,
    Select(Option<String>),
    Fetch { download: bool },
    DownloadAttachments(Option<String>),
    Delete,
    Logout,
    Upload,
    Help(Option<String>),
    Exit,
    Empty,
}

/// (name, help text) for `help`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("connect", "Connect to an IMAP server (asks for server, port and SSL)."),
    ("login", "Log in with a username and password."),
    ("list", "List the folders on the server."),
    ("select", "select [folder]: select a folder to work in."),
    ("fetch", "fetch [-d]: show the newest messages; -d also saves their attachments."),
    ("download_attachments", "download_attachments [id]: save one message's attachments."),
    ("delete", "Delete messages by id (comma-separated) and expunge."),
    ("logout", "Log out and close the connection."),
    ("upload", "Compose a plain-text message and append it to a folder."),
    ("help", "help [command]: list commands or describe one."),
    ("exit", "Log out if needed and leave the shell."),
];

impl Command {
    /// Parse a command line. The error is the unknown command word.
    pub fn parse(line: &str) -> std::result::Result<Command, String> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((w, a)) => (w, a.trim()),
            None => (line, ""),
        };
        let arg_opt = (!arg.is_empty()).then(|| arg.to_string());

        // `?` works glued to its argument too, as in `?fetch`.
        if let Some(rest) = word.strip_prefix('?') {
            let topic = if rest.is_empty() { arg_opt } else { Some(rest.to_string()) };
            return Ok(Command::Help(topic));
        }

        let cmd = match word {
            "" => Command::Empty,
            "connect" => Command::Connect,
            "login" => Command::Login,
            "list" => Command::List,
            "select" => Command::Select(arg_opt),
            "fetch" => Command::Fetch {
                download: arg.split_whitespace().any(|a| a == "-d"),
            },
            "download_attachments" => Command::DownloadAttachments(arg_opt),
            "delete" => Command::Delete,
            "logout" => Command::Logout,
            "upload" => Command::Upload,
            "help" => Command::Help(arg_opt),
            "exit" | "quit" | "EOF" => Command::Exit,
            other => return Err(other.to_string()),
        };
        Ok(cmd)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Shell<P: Prompt, W: Write> {
    prompt: P,
    out: W,
    settings: Settings,
    connector: Box<dyn Connector>,
    client: Option<ImapClient>,
    color: bool,
}

impl<P: Prompt, W: Write> Shell<P, W> {
    pub fn new(prompt: P, out: W, settings: Settings, connector: Box<dyn Connector>) -> Self {
        Shell {
            prompt,
            out,
            settings,
            connector,
            client: None,
            color: false,
        }
    }

    /// Colour failure lines; only worth it when `out` is a terminal.
    pub fn colored(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Read and run commands until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "{}\n", INTRO)?;
        loop {
            self.out.flush()?;
            let line = match self.prompt.read_line(PROMPT)? {
                Some(line) => line,
                None => {
                    writeln!(self.out)?;
                    self.exit()?;
                    break;
                }
            };
            match Command::parse(&line) {
                Ok(cmd) => {
                    debug!(?cmd, "shell command");
                    if self.dispatch(cmd)? == Flow::Exit {
                        break;
                    }
                }
                Err(_) => writeln!(self.out, "*** Unknown syntax: {}", line.trim())?,
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn dispatch(&mut self, cmd: Command) -> Result<Flow> {
        match cmd {
            Command::Empty => {}
            Command::Connect => self.connect()?,
            Command::Login => self.login()?,
            Command::List => self.list()?,
            Command::Select(folder) => self.select(folder)?,
            Command::Fetch { download } => self.fetch(download)?,
            Command::DownloadAttachments(id) => self.download_attachments(id)?,
            Command::Delete => self.delete()?,
            Command::Logout => self.logout()?,
            Command::Upload => self.upload()?,
            Command::Help(topic) => self.help(topic)?,
            Command::Exit => {
                self.exit()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn connect(&mut self) -> Result<()> {
        let endpoint = ui::ask_endpoint(&mut self.prompt, &self.settings)?;

        // A new connect replaces any previous session.
        if let Some(mut old) = self.client.take() {
            if let Err(e) = old.logout() {
                debug!("dropping previous session: {}", e);
            }
        }

        writeln!(self.out, "Connecting to {}...", endpoint)?;
        let spinner = ui::spinner("Connecting...");
        let server = endpoint.server.clone();
        let result = ImapClient::connect(self.connector.as_ref(), endpoint, self.settings.fetch_limit);
        spinner.finish_and_clear();

        match result {
            Ok(client) => {
                self.client = Some(client);
                writeln!(self.out, "Connected to {} successfully.", server)?;
            }
            Err(e) => ui::report_failure(&mut self.out, self.color, "Connection", &e)?,
        }
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_CONNECTED)?;
            return Ok(());
        };
        let username = self.prompt.text("Username", self.settings.username.as_deref())?;
        let password = self.prompt.password("Password")?;
        match client.login(username.trim(), &password) {
            Ok(()) => writeln!(self.out, "Logged in successfully!")?,
            Err(e) => ui::report_failure(&mut self.out, self.color, "Login", &e)?,
        }
        Ok(())
    }

    fn list(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };
        match client.list_folders() {
            Ok(folders) => {
                writeln!(self.out, "Folders:")?;
                for folder in folders {
                    writeln!(self.out, "- {}", folder)?;
                }
            }
            Err(e) => ui::report_failure(&mut self.out, self.color, "Listing folders", &e)?,
        }
        Ok(())
    }

    fn select(&mut self, folder: Option<String>) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };
        let folder = match folder {
            Some(f) => f,
            None => self.prompt.text("Folder", None)?,
        };
        match client.select_folder(&folder) {
            Ok(()) => writeln!(self.out, "Selected folder '{}'.", folder)?,
            Err(e) => ui::report_failure(&mut self.out, self.color, &format!("Selecting folder '{}'", folder), &e)?,
        }
        Ok(())
    }

    fn fetch(&mut self, download: bool) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };

        let spinner = ui::spinner("Fetching messages...");
        let result = client.fetch_emails();
        spinner.finish_and_clear();

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                ui::report_failure(&mut self.out, self.color, "Fetching messages", &e)?;
                return Ok(());
            }
        };
        if fetched.is_empty() {
            writeln!(self.out, "No messages found.")?;
            return Ok(());
        }

        for (id, outcome) in &fetched {
            let view = match outcome {
                Ok(view) => view,
                Err(e) => {
                    ui::report_failure(&mut self.out, self.color, &format!("Fetching message {}", id), e)?;
                    continue;
                }
            };
            ui::write_email_info(&mut self.out, view, self.settings.preview_chars)?;
            if download && !view.attachments.is_empty() {
                match save_attachments(&self.settings.attachments_dir, &view.attachments) {
                    Ok(saved) => ui::write_saved(&mut self.out, self.color, &saved)?,
                    Err(e) => ui::report_failure(&mut self.out, self.color, "Creating attachments directory", &e)?,
                }
            }
        }
        Ok(())
    }

    fn download_attachments(&mut self, id: Option<String>) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };
        let id = match id {
            Some(arg) => match parse_ids(&arg).as_slice() {
                [id] => *id,
                _ => {
                    writeln!(self.out, "Invalid message ID!")?;
                    return Ok(());
                }
            },
            None => self.prompt.number("Message ID")?,
        };

        let view = match client.fetch_message(id) {
            Ok(Some(view)) => view,
            Ok(None) => {
                writeln!(self.out, "No data found for message ID {}.", id)?;
                return Ok(());
            }
            Err(e) => {
                ui::report_failure(&mut self.out, self.color, &format!("Fetching message {}", id), &e)?;
                return Ok(());
            }
        };
        if view.attachments.is_empty() {
            writeln!(self.out, "No attachments in message {}.", id)?;
            return Ok(());
        }
        match save_message_attachments(&self.settings.attachments_dir, id, &view.attachments) {
            Ok(saved) => {
                ui::write_saved(&mut self.out, self.color, &saved)?;
                let dir = message_dir(&self.settings.attachments_dir, id);
                writeln!(self.out, "Attachments downloaded to {}", dir.display())?;
            }
            Err(e) => ui::report_failure(&mut self.out, self.color, "Creating attachments directory", &e)?,
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };
        let input = self.prompt.text("Message IDs to delete (comma-separated)", None)?;
        let ids = parse_ids(&input);
        if ids.is_empty() {
            writeln!(self.out, "No valid message IDs provided.")?;
            return Ok(());
        }
        let question = format!("Are you sure you want to delete {} message(s)?", ids.len());
        if !self.prompt.confirm(&question, false)? {
            writeln!(self.out, "Deletion cancelled.")?;
            return Ok(());
        }
        match client.delete_messages(&ids) {
            Ok(n) => writeln!(self.out, "Deleted {} message(s).", n)?,
            Err(e) => ui::report_failure(&mut self.out, self.color, "Deleting messages", &e)?,
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        match self.client.take() {
            Some(mut client) => match client.logout() {
                Ok(()) => writeln!(self.out, "Logged out successfully.")?,
                Err(e) => ui::report_failure(&mut self.out, self.color, "Logout", &e)?,
            },
            None => writeln!(self.out, "Client is already disconnected.")?,
        }
        Ok(())
    }

    fn upload(&mut self) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            writeln!(self.out, "{}", NOT_READY)?;
            return Ok(());
        };
        let draft = ui::ask_draft(&mut self.prompt, &self.settings)?;
        match client.upload(&draft) {
            Ok(()) => writeln!(self.out, "Email uploaded to folder '{}' successfully!", draft.folder)?,
            Err(e) => ui::report_failure(&mut self.out, self.color, "Upload", &e)?,
        }
        Ok(())
    }

    fn help(&mut self, topic: Option<String>) -> Result<()> {
        match topic {
            None => {
                writeln!(self.out, "Documented commands (type help <topic>):")?;
                writeln!(self.out, "{}", "=".repeat(40))?;
                let names: Vec<&str> = COMMANDS.iter().map(|(name, _)| *name).collect();
                writeln!(self.out, "{}\n", names.join("  "))?;
            }
            Some(topic) => match COMMANDS.iter().find(|(name, _)| *name == topic) {
                Some((_, text)) => writeln!(self.out, "{}", text)?,
                None => writeln!(self.out, "*** No help on {}", topic)?,
            },
        }
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        writeln!(self.out, "Goodbye!")?;
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.logout() {
                writeln!(self.out, "Error during logout: {}", e)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(Command::parse("connect"), Ok(Command::Connect));
        assert_eq!(Command::parse("  select  INBOX "), Ok(Command::Select(Some("INBOX".into()))));
        assert_eq!(Command::parse("select"), Ok(Command::Select(None)));
        assert_eq!(Command::parse("fetch -d"), Ok(Command::Fetch { download: true }));
        assert_eq!(Command::parse("fetch"), Ok(Command::Fetch { download: false }));
        assert_eq!(
            Command::parse("download_attachments 12"),
            Ok(Command::DownloadAttachments(Some("12".into())))
        );
        assert_eq!(Command::parse(""), Ok(Command::Empty));
        assert_eq!(Command::parse("?"), Ok(Command::Help(None)));
        assert_eq!(Command::parse("?fetch"), Ok(Command::Help(Some("fetch".into()))));
        assert_eq!(Command::parse("help login"), Ok(Command::Help(Some("login".into()))));
        assert_eq!(Command::parse("exit"), Ok(Command::Exit));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(Command::parse("frobnicate now"), Err("frobnicate".into()));
    }

    #[test]
    fn every_command_has_help() {
        for word in ["connect", "login", "list", "select", "fetch", "download_attachments", "delete", "logout", "upload", "exit"] {
            assert!(COMMANDS.iter().any(|(name, _)| *name == word), "{}", word);
        }
    }
}
