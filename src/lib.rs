// Library root
// -----------
// This crate exposes a small library surface for the IMAP front ends. The
// binary (`main.rs`) picks the shell or the dashboard and hands it a
// connector.
//
// Module responsibilities:
// - `client`: the session wrapper; one library call per user action.
// - `mailbox`: the trait seam over the `imap` crate and its TCP/TLS stream.
// - `message`: decoding fetched messages and composing uploads.
// - `attachments`: writing attachment files to disk.
// - `listing`: listed message ids and id parsing for the dashboard.
// - `ui`: prompts, spinner and output formatting shared by both front ends.
// - `shell` / `dashboard`: the two front ends; `window` draws the dashboard.
// - `config`, `logging`, `error`: settings file, tracing setup, error type.
pub mod attachments;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod listing;
pub mod logging;
pub mod mailbox;
pub mod message;
pub mod shell;
pub mod ui;
pub mod window;
