use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use muse::config;
use muse::gateway::{AiGateway, GeminiGateway};
use muse::models::{Role, ThemeConfig, VOICES};
use muse::services::{
    ChangeNotifier, ChatController, ImageHistory, ImageStudio, ProcessPlayer, SessionStore,
    SpeechController, StateEvent, Storage, ThemeStore,
};

/// Minimal terminal front end over the engine. It owns no state: it reads
/// store snapshots, reacts to change events and issues user intents.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;

    let storage = Storage::open().await?;
    let notifier = ChangeNotifier::new();

    let sessions = Arc::new(SessionStore::new(storage.clone(), notifier.clone()));
    let images = Arc::new(ImageHistory::new(storage.clone(), notifier.clone()));
    let theme = Arc::new(ThemeStore::new(storage, notifier.clone()));
    sessions.hydrate().await;
    images.hydrate().await;
    theme.hydrate().await;

    let gateway: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(api_key));
    let controller = ChatController::new(gateway.clone(), sessions.clone(), images.clone());
    let studio = ImageStudio::new(gateway.clone(), images.clone());
    let speech = Arc::new(SpeechController::new(gateway, Arc::new(ProcessPlayer)));

    if let Some(active) = sessions.active_id() {
        if let Some(session) = sessions.session(&active) {
            if let Some(welcome) = session.messages.last() {
                println!("{}: {}", config::APP_NAME, welcome.content);
            }
        }
    }
    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" => break,
            "/help" => print_help(),
            "/new" => {
                sessions.create_session().await;
                println!("Started a new chat.");
            }
            "/images" => {
                let history = images.images();
                if history.is_empty() {
                    println!("No generated images yet.");
                }
                for image in history {
                    println!("{}  {}", image.timestamp.format("%Y-%m-%d %H:%M"), image.prompt);
                }
            }
            "/voices" => {
                for voice in VOICES {
                    println!("{}", voice.label);
                }
            }
            "/theme" => {
                let next = if theme.current().is_dark {
                    ThemeConfig::for_color(config::PASTEL_COLORS[0], true)
                } else {
                    ThemeConfig::default()
                };
                theme.select(next).await;
                println!("Theme switched.");
            }
            "/speak" => {
                let spoken = sessions.active_id().and_then(|active| {
                    sessions.session(&active).and_then(|s| {
                        s.messages
                            .iter()
                            .rev()
                            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
                            .map(|m| m.content.clone())
                    })
                });
                match spoken {
                    Some(text) => {
                        let speech = speech.clone();
                        tokio::spawn(async move { speech.toggle(&text).await });
                    }
                    None => println!("Nothing to speak yet."),
                }
            }
            _ if line.starts_with("/voice ") => {
                speech.set_voice(line.trim_start_matches("/voice ").trim());
            }
            _ if line.starts_with("/variations ") => {
                let prompt = line.trim_start_matches("/variations ").trim();
                if prompt.is_empty() {
                    println!("Usage: /variations <prompt>");
                } else {
                    println!("Generating {} styled variations...", config::VARIATION_STYLES.len());
                    let generated = studio.generate_variations(prompt).await;
                    println!("{} variation(s) recorded — see /images", generated.len());
                }
            }
            _ if line.starts_with('/') => {
                println!("Unknown command. /help lists commands.");
            }
            _ => {
                let Some(active) = sessions.active_id() else {
                    continue;
                };
                run_turn(&controller, &sessions, &notifier, &active, &line).await;
            }
        }
    }

    Ok(())
}

/// Drive one submitted turn, echoing the assistant reply as it lands in
/// the store.
async fn run_turn(
    controller: &ChatController,
    sessions: &SessionStore,
    notifier: &ChangeNotifier,
    session_id: &str,
    line: &str,
) {
    let mut events = notifier.subscribe();
    let turn = controller.submit(session_id, line, None);
    tokio::pin!(turn);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            _ = &mut turn => break,
            event = events.recv() => {
                if event == Some(StateEvent::SessionsChanged) {
                    print_reply_progress(sessions, session_id, &mut printed);
                }
            }
        }
    }
    print_reply_progress(sessions, session_id, &mut printed);
    if printed > 0 {
        println!();
    }

    if let Some(session) = sessions.session(session_id) {
        if session.messages.last().is_some_and(|m| m.image.is_some()) {
            println!("[image generated — see /images]");
        }
    }
}

/// Print whatever new assistant output arrived since the last call. The
/// streamed content only ever grows by appending, so the printed prefix
/// stays valid.
fn print_reply_progress(sessions: &SessionStore, session_id: &str, printed: &mut usize) {
    let Some(session) = sessions.session(session_id) else {
        return;
    };
    let Some(last) = session.messages.last() else {
        return;
    };
    if last.role != Role::Assistant {
        return;
    }
    if last.content.len() > *printed {
        if *printed == 0 {
            print!("{}: ", config::APP_NAME);
        }
        print!("{}", &last.content[*printed..]);
        let _ = std::io::stdout().flush();
        *printed = last.content.len();
    }
}

fn print_help() {
    println!("/new                 start a new chat session");
    println!("/images              list generated images, newest first");
    println!("/variations <prompt> generate one image per style");
    println!("/speak               read the last reply aloud (again to stop)");
    println!("/voice <name>        pick a voice (/voices to list them)");
    println!("/theme               flip between dark and pastel");
    println!("/quit                exit");
}
