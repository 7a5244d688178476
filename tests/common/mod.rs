// In-memory mailbox and scripted prompts for driving the front ends.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::rc::Rc;

use imap_shell::config::Settings;
use imap_shell::error::{ClientError, Result};
use imap_shell::mailbox::{Connector, Endpoint, Login, Mailbox};
use imap_shell::ui::Prompt;

pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct ServerState {
    pub refuse: bool,
    /// Ids whose FETCH the server rejects.
    pub fail_fetch: Vec<u32>,
    pub folders: BTreeMap<String, BTreeMap<u32, Vec<u8>>>,
    pub selected: Option<String>,
    pub connects: Vec<Endpoint>,
    pub appended: Vec<(String, Vec<u8>)>,
    pub deleted: Vec<u32>,
    pub logged_out: bool,
}

#[derive(Clone, Default)]
pub struct FakeServer {
    pub state: Rc<RefCell<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        let server = FakeServer::default();
        server.add_folder("INBOX");
        server.add_folder("Sent");
        server
    }

    pub fn add_folder(&self, name: &str) {
        self.state.borrow_mut().folders.entry(name.to_string()).or_default();
    }

    pub fn add_message(&self, folder: &str, id: u32, raw: &[u8]) {
        self.state
            .borrow_mut()
            .folders
            .entry(folder.to_string())
            .or_default()
            .insert(id, raw.to_vec());
    }

    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(self.clone())
    }
}

fn refused(msg: &str) -> ClientError {
    ClientError::Io(io::Error::new(ErrorKind::Other, msg.to_string()))
}

impl Connector for FakeServer {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Login>> {
        let mut state = self.state.borrow_mut();
        if state.refuse {
            return Err(ClientError::Io(io::Error::new(
                ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        state.connects.push(endpoint.clone());
        Ok(Box::new(FakeLogin(self.clone())))
    }
}

struct FakeLogin(FakeServer);

impl Login for FakeLogin {
    fn login(
        self: Box<Self>,
        _username: &str,
        password: &str,
    ) -> std::result::Result<Box<dyn Mailbox>, (ClientError, Box<dyn Login>)> {
        if password == PASSWORD {
            Ok(Box::new(FakeMailbox(self.0.clone())))
        } else {
            let retry: Box<dyn Login> = self;
            Err((refused("authentication failed"), retry))
        }
    }
}

struct FakeMailbox(FakeServer);

impl Mailbox for FakeMailbox {
    fn list_folders(&mut self) -> Result<Vec<String>> {
        Ok(self.0.state.borrow().folders.keys().cloned().collect())
    }

    fn select(&mut self, folder: &str) -> Result<()> {
        let mut state = self.0.state.borrow_mut();
        if !state.folders.contains_key(folder) {
            return Err(refused("no such mailbox"));
        }
        state.selected = Some(folder.to_string());
        Ok(())
    }

    fn search_all(&mut self) -> Result<Vec<u32>> {
        let state = self.0.state.borrow();
        let folder = state.selected.as_ref().ok_or_else(|| refused("no mailbox selected"))?;
        Ok(state.folders[folder].keys().copied().collect())
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let state = self.0.state.borrow();
        if state.fail_fetch.contains(&id) {
            return Err(refused("BAD fetch"));
        }
        let folder = state.selected.as_ref().ok_or_else(|| refused("no mailbox selected"))?;
        Ok(state.folders[folder].get(&id).cloned())
    }

    fn delete(&mut self, ids: &[u32]) -> Result<()> {
        let mut state = self.0.state.borrow_mut();
        let folder = state.selected.clone().ok_or_else(|| refused("no mailbox selected"))?;
        for id in ids {
            if let Some(messages) = state.folders.get_mut(&folder) {
                messages.remove(id);
            }
            state.deleted.push(*id);
        }
        Ok(())
    }

    fn append(&mut self, folder: &str, message: &[u8]) -> Result<()> {
        let mut state = self.0.state.borrow_mut();
        if !state.folders.contains_key(folder) {
            return Err(refused("[TRYCREATE] no such mailbox"));
        }
        state.appended.push((folder.to_string(), message.to_vec()));
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.0.state.borrow_mut().logged_out = true;
        Ok(())
    }
}

/// Answers every prompt from a fixed script, in order.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        ScriptedPrompt {
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn next(&mut self, label: &str) -> io::Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(ErrorKind::UnexpectedEof, format!("no answer for {}", label)))
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(self.answers.pop_front())
    }

    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        let answer = self.next(label)?;
        match (answer.is_empty(), default) {
            (true, Some(d)) => Ok(d.to_string()),
            _ => Ok(answer),
        }
    }

    fn password(&mut self, label: &str) -> io::Result<String> {
        self.next(label)
    }

    fn port(&mut self, label: &str, default: u16) -> io::Result<u16> {
        let answer = self.next(label)?;
        if answer.is_empty() {
            return Ok(default);
        }
        answer
            .parse()
            .map_err(|_| io::Error::new(ErrorKind::InvalidInput, answer))
    }

    fn number(&mut self, label: &str) -> io::Result<u32> {
        let answer = self.next(label)?;
        answer
            .parse()
            .map_err(|_| io::Error::new(ErrorKind::InvalidInput, answer))
    }

    fn confirm(&mut self, label: &str, default: bool) -> io::Result<bool> {
        Ok(match self.next(label)?.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }
}

/// Settings with attachments written to a fresh scratch directory.
pub fn settings(test: &str) -> Settings {
    let dir = scratch_dir(test);
    Settings {
        attachments_dir: dir,
        ..Settings::default()
    }
}

pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("imap-shell-it-{}-{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

pub fn plain_message(subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: Alice <alice@example.org>\r\nTo: bob@example.org\r\nSubject: {}\r\nDate: Mon, 6 Jan 2025 09:30:00 +0000\r\n\r\n{}\r\n",
        subject, body
    )
    .into_bytes()
}

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n\x00\x01\x02\xff\xfe binary tail";

/// A multipart message whose attachment decodes to `PDF_BYTES`.
pub fn message_with_attachment() -> Vec<u8> {
    // base64 of PDF_BYTES
    let encoded = "JVBERi0xLjQKAAEC//4gYmluYXJ5IHRhaWw=";
    format!(
        "From: Carol <carol@example.org>\r\n\
Subject: Invoice\r\n\
Date: Tue, 7 Jan 2025 10:00:00 +0100\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Invoice attached.\r\n\
--b1\r\n\
Content-Type: application/pdf; name=\"invoice.pdf\"\r\n\
Content-Disposition: attachment; filename=\"invoice.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
{}\r\n\
--b1--\r\n",
        encoded
    )
    .into_bytes()
}
