use std::io::Write;

use anyhow::Result;
use parley_client::{ApiClient, ChatSession, SubmitBlocked, SubmitError, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /register <user> <password>
  /login <user> <password>
  /logout
  /new                 start a new chat
  /threads             list your threads
  /open <n>            open thread n from /threads
  /delete <n>          delete thread n
  /quit
Anything else is sent as a message.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    
    let base_url = std::env::var("PARLEY_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let session = ChatSession::new(ApiClient::new(&base_url)?);
    
    println!("Parley chat ({})", base_url);
    println!("==================\n");
    println!("{}\n", HELP);
    
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();
        
        match command {
            "" => {}
            "/quit" => break,
            "/help" => println!("{}", HELP),
            "/register" | "/login" if args.len() != 2 => {
                println!("   usage: {} <user> <password>", command);
            }
            "/register" => {
                if session.register(args[0], args[1]).await.is_ok() {
                    println!("   ✓ Registered {}, now /login", args[0]);
                }
            }
            "/login" => {
                if session.login(args[0], args[1]).await.is_ok() {
                    println!("   ✓ Logged in as {}", args[0]);
                    print_threads(&session);
                }
            }
            "/logout" => {
                session.logout().await;
                println!("   ✓ Logged out");
            }
            "/new" => {
                session.new_chat();
                println!("   ✓ New chat");
            }
            "/threads" => {
                if session.refresh_threads().await.is_ok() {
                    print_threads(&session);
                }
            }
            "/open" | "/delete" => match thread_at(&session, &args) {
                Some(thread_id) if command == "/open" => {
                    if let Ok(true) = session.open_thread(&thread_id).await {
                        for message in session.snapshot().messages() {
                            println!("   [{:?}] {}", message.role, message.content);
                        }
                    }
                }
                Some(thread_id) => {
                    if session.delete_thread(&thread_id).await.is_ok() {
                        println!("   ✓ Deleted");
                    }
                }
                None => println!("   usage: {} <n>, see /threads", command),
            },
            _ => send(&session, line).await?,
        }
        
        if let Some(notice) = session.take_notice() {
            println!("   ! {}", notice);
        }
        prompt()?;
    }
    
    Ok(())
}

async fn send(session: &ChatSession<ApiClient>, text: &str) -> Result<()> {
    match session.submit(text).await {
        Ok(SubmitOutcome::Shown) => {
            let Some(mut frames) = session.reveal_frames() else {
                return Ok(());
            };
            let mut printed = 0;
            print!("   ");
            while frames.changed().await.is_ok() {
                let frame = frames.borrow_and_update().clone();
                print!("{}", &frame.shown[printed..]);
                std::io::stdout().flush()?;
                printed = frame.shown.len();
                if frame.done {
                    break;
                }
            }
            println!();
        }
        Ok(SubmitOutcome::Stale) | Ok(SubmitOutcome::Reloaded) => {}
        Err(SubmitError::Blocked(SubmitBlocked::NeedsAuth)) => println!("   Use /login first"),
        Err(SubmitError::Blocked(SubmitBlocked::AlreadyPending)) => println!("   Still waiting for the last reply"),
        Err(SubmitError::Blocked(SubmitBlocked::EmptyMessage)) => {}
        Err(SubmitError::Failed(_)) => {}
    }
    Ok(())
}

fn thread_at(session: &ChatSession<ApiClient>, args: &[&str]) -> Option<String> {
    let index: usize = args.first()?.parse().ok()?;
    let state = session.snapshot();
    state
        .threads()
        .get(index.checked_sub(1)?)
        .map(|t| t.thread_id.clone())
}

fn print_threads(session: &ChatSession<ApiClient>) {
    let state = session.snapshot();
    if state.threads().is_empty() {
        println!("   (no threads yet)");
    }
    for (i, thread) in state.threads().iter().enumerate() {
        let marker = if thread.thread_id == state.current_thread_id() { "*" } else { " " };
        println!("  {}{}. {}", marker, i + 1, thread.title);
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
