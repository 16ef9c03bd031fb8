//! rmp-chat: terminal chat with the Rate My Professor assistant.
//!
//! Commands at the prompt: `/signout` ends the session, `/quit` exits.

use anyhow::Result;
use clap::Parser;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Text;
use rmp_chat::{gate_state, render, AuthSession, ChatSession, GateState, HttpTransport, TokenSession};
use rmp_core::init_file_tracing;
use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const PREVIEW_CHARS: usize = 120;

#[derive(Parser)]
#[command(name = "rmp-chat")]
#[command(about = "Chat with the Rate My Professor assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Server base URL; overrides RMP_SERVER_URL.
    #[arg(short, long)]
    server_url: Option<String>,
    /// Session token; overrides RMP_SESSION_TOKEN.
    #[arg(short, long)]
    token: Option<String>,
    #[arg(long, default_value = "logs/rmp-chat.log")]
    log_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_file_tracing(&cli.log_file)?;

    let server_url = cli
        .server_url
        .or_else(|| std::env::var("RMP_SERVER_URL").ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let mut auth = TokenSession::from_env();
    if let Some(token) = cli.token {
        auth = TokenSession::new(Some(token), auth.redirect_to_sign_in());
    }

    match gate_state(&auth) {
        GateState::Loading => {
            println!("Loading...");
            return Ok(());
        }
        GateState::SignedOut => {
            print_sign_in(&auth);
            return Ok(());
        }
        GateState::SignedIn => {}
    }

    let mut session = ChatSession::new(HttpTransport::new(&server_url), auth);
    let assistant_label = Style::new().green().bold();
    let error_style = Style::new().red();

    for message in session.conversation().messages() {
        println!("{}\n{}\n", assistant_label.apply_to("Assistant"), render(&message.content));
    }

    loop {
        let input = match Text::new(">").with_placeholder("Message").prompt() {
            Ok(input) => input,
            Err(_) => break,
        };
        let input = input.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/signout" => {
                session.sign_out();
                println!("Signed out.");
                print_sign_in(session.auth());
                break;
            }
            _ => {}
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        progress_bar.set_message("Thinking...");

        let mut preview = String::new();
        let result = session
            .send_message(input, |piece| {
                preview.push_str(&piece.replace('\n', " "));
                let tail: String = preview
                    .chars()
                    .rev()
                    .take(PREVIEW_CHARS)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                progress_bar.set_message(tail);
            })
            .await;
        progress_bar.finish_and_clear();

        if let Some(reply) = session.conversation().last().filter(|m| !m.content.is_empty()) {
            println!("{}\n{}\n", assistant_label.apply_to("Assistant"), render(&reply.content));
        }
        if let Err(e) = result {
            eprintln!("{}", error_style.apply_to(e));
        }
    }

    Ok(())
}

fn print_sign_in(auth: &dyn AuthSession) {
    println!(
        "Sign in at {} and set RMP_SESSION_TOKEN (or pass --token) to start chatting.",
        auth.redirect_to_sign_in()
    );
}
