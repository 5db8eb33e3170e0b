use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use wayfare_notify::render::View;
use wayfare_notify::store::DELETE_ALL_PROMPT;
use wayfare_notify::{Config, Session, SessionStatus, TokenCell, WriteOutcome};
use wayfare_types::ConnectionState;

const HELP: &str = "commands: refresh | rm <id> | clear | token <value> | logout | show | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Config
    let config = Config::from_env()?;
    info!("Notification center against {} / {}", config.api_base, config.ws_base);

    let tokens = TokenCell::new(config.access_token.clone());
    let session = Session::new(&config, tokens)?;

    // Re-render whenever the store changes
    let mut snapshots = session.store().subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let view = View::from_snapshot(&snapshots.borrow_and_update());
            print_view(&view);
        }
    });

    let mut states = session.channel().subscribe_state();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            match state {
                ConnectionState::Erroring => warn!("Live updates interrupted"),
                other => info!("Live updates: {:?}", other),
            }
        }
    });

    report(session.start().await);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !run_command(&session, &mut lines, line.trim()).await? {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.shutdown();
    info!("Bye");
    Ok(())
}

/// Returns `false` when the loop should stop.
async fn run_command(
    session: &Session,
    lines: &mut Lines<BufReader<Stdin>>,
    line: &str,
) -> anyhow::Result<bool> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) => {}
        (Some("quit" | "exit"), _) => return Ok(false),
        (Some("refresh"), _) => report(session.start().await),
        (Some("show"), _) => print_view(&View::from_snapshot(&session.store().snapshot())),
        (Some("rm"), Some(id)) => match id.parse() {
            Ok(id) => {
                let view = View::from_snapshot(&session.store().snapshot());
                match view.row(id) {
                    Some(row) => outcome(row.dismiss(session.store()).await),
                    None => println!("no notification {id}"),
                }
            }
            Err(_) => println!("not an id: {id}"),
        },
        (Some("clear"), _) => {
            print!("{DELETE_ALL_PROMPT} [y/N] ");
            std::io::stdout().flush()?;
            let answer = lines.next_line().await?.unwrap_or_default();
            let yes = matches!(answer.trim(), "y" | "Y" | "yes");
            outcome(session.store().delete_all(&move |_: &str| yes).await);
        }
        (Some("token"), Some(value)) => {
            session.tokens().set(value);
            report(session.start().await);
        }
        (Some("logout"), _) => session.sign_out().await,
        _ => println!("{HELP}"),
    }
    Ok(true)
}

fn report(status: SessionStatus) {
    match status {
        SessionStatus::SignedIn(profile) => {
            println!("signed in as {}", profile.display_name());
        }
        SessionStatus::SignedOut => println!("signed out (set a token with `token <value>`)"),
    }
}

fn outcome(outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Applied => {}
        WriteOutcome::SignedOut => println!("sign in first"),
        WriteOutcome::Declined => println!("kept"),
        WriteOutcome::Failed { message } => println!("{message}"),
    }
}

fn print_view(view: &View) {
    println!("{view}");
}
