// UI layer shared by the shell and the dashboard: the prompts they ask
// through, a spinner for slow library calls, and the formatting of what
// they print. Prompts go through a trait so both front ends can be driven
// by a script in tests.

use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::attachments::Saved;
use crate::config::Settings;
use crate::mailbox::Endpoint;
use crate::message::{Draft, MessageView};

/// Everything the front ends ask the user.
pub trait Prompt {
    /// Next shell command line; `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String>;
    fn password(&mut self, label: &str) -> io::Result<String>;
    fn port(&mut self, label: &str, default: u16) -> io::Result<u16>;
    fn number(&mut self, label: &str) -> io::Result<u32>;
    fn confirm(&mut self, label: &str, default: bool) -> io::Result<bool>;
}

/// Terminal prompts built on `dialoguer`.
#[derive(Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(label).allow_empty(true);
        if let Some(d) = default {
            input.default(d.to_string());
        }
        input.interact_text()
    }

    fn password(&mut self, label: &str) -> io::Result<String> {
        // `Password` hides input in terminal for passwords.
        Password::new().with_prompt(label).interact()
    }

    fn port(&mut self, label: &str, default: u16) -> io::Result<u16> {
        Input::<u16>::new().with_prompt(label).default(default).interact_text()
    }

    fn number(&mut self, label: &str) -> io::Result<u32> {
        Input::<u32>::new().with_prompt(label).interact_text()
    }

    fn confirm(&mut self, label: &str, default: bool) -> io::Result<bool> {
        Confirm::new().with_prompt(label).default(default).interact()
    }
}

/// Spinner shown while a library call blocks. Hidden when stderr is not a
/// terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print `<action> failed: <error>`, in red when `color` is set. Front ends
/// only set it when their output is a terminal.
pub fn report_failure(out: &mut dyn Write, color: bool, action: &str, err: &dyn Display) -> io::Result<()> {
    let line = format!("{} failed: {}", action, err);
    if color {
        writeln!(out, "{}", line.red())
    } else {
        writeln!(out, "{}", line)
    }
}

/// Ask for server, port and TLS, seeded from the settings.
pub fn ask_endpoint(prompt: &mut dyn Prompt, settings: &Settings) -> io::Result<Endpoint> {
    let server = prompt.text("Server", settings.server.as_deref())?;
    let port = prompt.port("Port", settings.port)?;
    let use_tls = prompt.confirm("Use SSL?", settings.use_tls)?;
    Ok(Endpoint {
        server: server.trim().to_string(),
        port,
        use_tls,
    })
}

/// Collect the fields of a message to upload.
pub fn ask_draft(prompt: &mut dyn Prompt, settings: &Settings) -> io::Result<Draft> {
    let folder = prompt.text("Folder to upload email (e.g., 'Sent')", Some(&settings.upload_folder))?;
    let subject = prompt.text("Subject", None)?;
    let body = prompt.text("Body", None)?;
    let sender = prompt.text("Sender email", settings.username.as_deref())?;
    let recipients = prompt.text("Recipient emails (comma-separated)", None)?;
    Ok(Draft {
        folder,
        sender,
        recipients: Draft::parse_recipients(&recipients),
        subject,
        body,
    })
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

/// Block printed for each fetched message.
pub fn write_email_info(out: &mut dyn Write, view: &MessageView, preview_chars: usize) -> io::Result<()> {
    writeln!(out, "Date: {}", or_none(&view.date))?;
    writeln!(out, "From: {}", or_none(&view.sender))?;
    writeln!(out, "Subject: {}", or_none(&view.subject))?;
    writeln!(out, "Body preview: {}", view.preview(preview_chars))?;
    writeln!(out, "{}", "-".repeat(40))
}

pub fn write_saved(out: &mut dyn Write, color: bool, saved: &[Saved]) -> io::Result<()> {
    for outcome in saved {
        match outcome {
            Saved::Written(path) => writeln!(out, "Attachment saved: {}", path.display())?,
            Saved::Failed { filename, error } => {
                report_failure(out, color, &format!("Saving attachment {}", filename), error)?
            }
        }
    }
    Ok(())
}
