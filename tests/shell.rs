mod common;

use common::{message_with_attachment, plain_message, settings, FakeServer, ScriptedPrompt, PASSWORD, PDF_BYTES};
use imap_shell::shell::Shell;

fn run(server: &FakeServer, script: &[&str], test: &str) -> (String, std::path::PathBuf) {
    let settings = settings(test);
    let dir = settings.attachments_dir.clone();
    let mut shell = Shell::new(ScriptedPrompt::new(script), Vec::new(), settings, server.connector());
    shell.run().unwrap();
    let out = String::from_utf8(shell.into_output()).unwrap();
    (out, dir)
}

#[test]
fn commands_before_connect_are_refused() {
    let server = FakeServer::new();
    let (out, _) = run(&server, &["login", "list", "fetch", "select INBOX", "delete", "upload", "logout"], "guards");

    assert!(out.contains("Not connected. Use 'connect' first."));
    assert_eq!(out.matches("Not connected. Use 'connect' and 'login' first.").count(), 5);
    assert!(out.contains("Client is already disconnected."));
    assert!(out.trim_end().ends_with("Goodbye!"));
}

#[test]
fn fetch_requires_selected_folder() {
    let server = FakeServer::new();
    let (out, _) = run(
        &server,
        &["connect", "imap.test", "993", "y", "login", "alice", PASSWORD, "fetch"],
        "no-folder",
    );
    assert!(out.contains("Connected to imap.test successfully."));
    assert!(out.contains("Logged in successfully!"));
    assert!(out.contains("no folder selected"));
}

#[test]
fn full_session_with_attachment_download() {
    let server = FakeServer::new();
    server.add_message("INBOX", 1, &plain_message("Hello", "first message body"));
    server.add_message("INBOX", 2, &message_with_attachment());

    let (out, dir) = run(
        &server,
        &[
            "connect", "imap.test", "", "n",
            "login", "alice", PASSWORD,
            "list",
            "select INBOX",
            "fetch -d",
            "download_attachments 2",
            "exit",
        ],
        "full",
    );

    {
        let state = server.state.borrow();
        assert_eq!(state.connects[0].port, 993);
        assert!(!state.connects[0].use_tls);
    }

    assert!(out.contains("Folders:\n- INBOX\n- Sent"));
    assert!(out.contains("Selected folder 'INBOX'."));
    assert!(out.contains("Subject: Hello"));
    assert!(out.contains("Body preview: first message body"));
    assert!(out.contains("Subject: Invoice"));

    assert_eq!(std::fs::read(dir.join("invoice.pdf")).unwrap(), PDF_BYTES);
    assert_eq!(std::fs::read(dir.join("message_2").join("invoice.pdf")).unwrap(), PDF_BYTES);
    assert!(out.contains("Attachments downloaded to"));
    assert!(out.contains("Goodbye!"));
    assert!(server.state.borrow().logged_out);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn delete_filters_ids_and_confirms() {
    let server = FakeServer::new();
    server.add_message("INBOX", 3, &plain_message("a", "b"));
    server.add_message("INBOX", 4, &plain_message("c", "d"));

    let (out, _) = run(
        &server,
        &[
            "connect", "imap.test", "993", "y",
            "login", "alice", PASSWORD,
            "select INBOX",
            "delete", "abc, x",
            "delete", "3, four", "n",
            "delete", "3, four, 4", "y",
        ],
        "delete",
    );

    assert!(out.contains("No valid message IDs provided."));
    assert!(out.contains("Deletion cancelled."));
    assert!(out.contains("Deleted 2 message(s)."));
    assert_eq!(server.state.borrow().deleted, vec![3, 4]);
}

#[test]
fn upload_and_unknown_commands() {
    let server = FakeServer::new();
    let (out, _) = run(
        &server,
        &[
            "connect", "imap.test", "993", "y",
            "login", "alice", PASSWORD,
            "upload", "", "Plans", "See you at 5", "alice@example.org", "bob@example.org, carol@example.org",
            "upload", "Archive", "x", "y", "alice@example.org", "bob@example.org",
            "bogus",
            "help fetch",
        ],
        "upload",
    );

    assert!(out.contains("Email uploaded to folder 'Sent' successfully!"));
    assert!(out.contains("Upload failed"));
    assert!(out.contains("*** Unknown syntax: bogus"));
    assert!(out.contains("fetch [-d]"));

    let state = server.state.borrow();
    assert_eq!(state.appended.len(), 1);
    let text = String::from_utf8_lossy(&state.appended[0].1);
    assert!(text.contains("carol@example.org"));
}

#[test]
fn wrong_password_reports_and_allows_retry() {
    let server = FakeServer::new();
    let (out, _) = run(
        &server,
        &["connect", "imap.test", "993", "y", "login", "alice", "nope", "login", "alice", PASSWORD],
        "retry",
    );
    assert!(out.contains("Login failed: authentication failed"));
    assert!(out.contains("Logged in successfully!"));
}

#[test]
fn fetch_reports_a_failed_message_and_goes_on() {
    let server = FakeServer::new();
    for id in 1..=3 {
        server.add_message("INBOX", id, &plain_message(&format!("msg {}", id), "body"));
    }
    server.state.borrow_mut().fail_fetch = vec![2];

    let (out, _) = run(
        &server,
        &["connect", "imap.test", "993", "y", "login", "alice", PASSWORD, "select INBOX", "fetch"],
        "fetch-partial",
    );
    assert!(out.contains("Subject: msg 1"));
    assert!(out.contains("Fetching message 2 failed: BAD fetch"));
    assert!(out.contains("Subject: msg 3"));
    assert!(!out.contains("Fetching messages failed"));
}

#[test]
fn failures_written_to_a_buffer_have_no_colour_codes() {
    let server = FakeServer::new();
    let (out, _) = run(
        &server,
        &["connect", "imap.test", "993", "y", "login", "alice", "nope", "select Nope"],
        "plain",
    );
    assert!(out.contains("Login failed: authentication failed"));
    assert!(out.contains("Selecting folder 'Nope' failed"));
    assert!(!out.contains('\x1b'));
}

#[test]
fn upload_with_blank_recipients_is_appended() {
    let server = FakeServer::new();
    let (out, _) = run(
        &server,
        &[
            "connect", "imap.test", "993", "y",
            "login", "alice", PASSWORD,
            "upload", "", "Draft", "later", "alice@example.org", " , ",
        ],
        "upload-draft",
    );
    assert!(out.contains("Email uploaded to folder 'Sent' successfully!"));

    let state = server.state.borrow();
    assert_eq!(state.appended.len(), 1);
    assert!(String::from_utf8_lossy(&state.appended[0].1).contains("Subject: Draft"));
}
