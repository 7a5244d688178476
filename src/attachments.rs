// Writing attachments to disk. Files are written exactly as decoded; a
// failure on one file is reported and the rest are still written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::message::Attachment;

/// Result of writing one attachment.
#[derive(Debug)]
pub enum Saved {
    Written(PathBuf),
    Failed { filename: String, error: io::Error },
}

/// Reduce an attachment name to its last path component so it always
/// lands inside the target directory.
pub fn safe_filename(name: &str) -> String {
    let last = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();
    match last {
        "" | "." | ".." => "attachment".to_string(),
        other => other.to_string(),
    }
}

/// Write every attachment into `dir`, creating it first.
pub fn save_attachments(dir: &Path, attachments: &[Attachment]) -> io::Result<Vec<Saved>> {
    fs::create_dir_all(dir)?;

    let saved = attachments
        .iter()
        .map(|att| {
            let path = dir.join(safe_filename(&att.filename));
            match fs::write(&path, &att.data) {
                Ok(()) => Saved::Written(path),
                Err(error) => {
                    warn!(path = %path.display(), "could not write attachment: {}", error);
                    Saved::Failed {
                        filename: att.filename.clone(),
                        error,
                    }
                }
            }
        })
        .collect();
    Ok(saved)
}

/// Directory for one message's attachments: `<dir>/message_<id>`.
pub fn message_dir(dir: &Path, msg_id: u32) -> PathBuf {
    dir.join(format!("message_{}", msg_id))
}

/// Write one message's attachments into `<dir>/message_<id>/`.
pub fn save_message_attachments(
    dir: &Path,
    msg_id: u32,
    attachments: &[Attachment],
) -> io::Result<Vec<Saved>> {
    save_attachments(&message_dir(dir, msg_id), attachments)
}
