// Entrypoint for the IMAP client.
// - `--gui` opens the dashboard window, otherwise the command shell runs.
// - Returns `anyhow::Result`; library failures are printed by the front
//   ends, only terminal and config errors end up here.

use clap::Parser;
use crossterm::tty::IsTty;
use std::io;
use std::path::PathBuf;

use imap_shell::config::Settings;
use imap_shell::logging;
use imap_shell::mailbox::ImapConnector;
use imap_shell::shell::Shell;
use imap_shell::ui::TerminalPrompt;
use imap_shell::window;

#[derive(Parser, Debug)]
#[command(name = "imap-shell", version, about = "Interactive IMAP mailbox client")]
struct Args {
    /// Open the dashboard window instead of the command shell
    #[arg(long)]
    gui: bool,

    /// Settings file (defaults to <config dir>/imap-shell/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log library calls to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let settings = Settings::load(args.config.as_deref())?;
    let connector = Box::new(ImapConnector::new(settings.connect_timeout()));

    if args.gui {
        window::open(settings, connector)?;
    } else {
        let color = io::stdout().is_tty();
        Shell::new(TerminalPrompt, io::stdout(), settings, connector)
            .colored(color)
            .run()?;
    }
    Ok(())
}
