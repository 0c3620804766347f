use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use lead_funnel::api::{FunnelApi, HttpApi};
use lead_funnel::chat::Typewriter;
use lead_funnel::config::FunnelConfig;
use lead_funnel::funnel::{Funnel, Route};
use lead_funnel::store::{FileSessionStore, SessionStore};
use lead_funnel::view::{ChatView, LoginView, Progress, Sender, WizardView};
use lead_funnel::wizard::{FormSchema, OnboardingWizard, StepOutcome};

/// Renders every component to the terminal.
struct TerminalView;

impl WizardView for TerminalView {
    fn render(&self, progress: &Progress) {
        println!("[{}] {:.0}%", progress.label, progress.percent);
    }

    fn flag_field(&self, field: &str, clear_after: Duration) {
        println!("  ✗ campo obrigatório: {field} ({}ms)", clear_after.as_millis());
    }

    fn show_error(&self, message: &str) {
        println!("  ⚠ {message}");
    }

    fn navigate(&self, path: &str) {
        println!("→ {path}");
    }
}

impl LoginView for TerminalView {
    fn show_error(&self, message: &str) {
        println!("  ⚠ {message}");
    }

    fn navigate(&self, path: &str) {
        println!("→ {path}");
    }
}

impl ChatView for TerminalView {
    fn set_visible(&self, visible: bool) {
        println!("{}", if visible { "💬 chat aberto" } else { "💬 chat fechado" });
    }

    fn append(&self, sender: Sender, text: &str) {
        match sender {
            Sender::User => println!("você: {text}"),
            Sender::Bot => println!("bot: {text}"),
        }
    }

    fn begin_reveal(&self) {
        print!("bot: ");
        let _ = std::io::stdout().flush();
    }

    fn update_reveal(&self, partial: &str) {
        // Only the newest character is printed.
        if let Some(ch) = partial.chars().last() {
            print!("{ch}");
            let _ = std::io::stdout().flush();
        }
    }
}

const HELP: &str = "\
Comandos:
  /go <rota>                 navegar (/, /checkout, /onboarding, /success, /login)
  /checkout <email> <whats>  enviar checkout
  /chat                      abrir/fechar o chat
  /set <campo> <valor...>    preencher campo do onboarding
  /pick <campo> <opção>      marcar opção (canal, objetivo)
  /unpick <campo> <opção>    desmarcar opção
  /next  /back  /submit      navegar no onboarding
  /login <email> <senha>     entrar no painel
  /quit                      sair
Qualquer outro texto é enviado ao chat.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FunnelConfig::from_env()?;

    let session_dir =
        std::env::var("FUNNEL_SESSION_DIR").unwrap_or_else(|_| "./data/sessions".to_string());
    let store = match std::env::var("FUNNEL_SESSION_ID") {
        Ok(id) => FileSessionStore::open(std::path::Path::new(&session_dir), id.parse()?)?,
        Err(_) => FileSessionStore::create(std::path::Path::new(&session_dir))?,
    };

    eprintln!("🧲 Lead funnel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   Session: {} ({})", store.session_id(), store.path().display());
    eprintln!("   Resume with FUNNEL_SESSION_ID={}\n", store.session_id());
    eprintln!("{HELP}\n");

    let file_store = Arc::new(store);
    let store: Arc<dyn SessionStore> = file_store.clone();
    let api: Arc<dyn FunnelApi> = Arc::new(HttpApi::new(&config)?);
    let view = Arc::new(TerminalView);
    let (playback, player) = Typewriter::new(view.clone(), config.reveal_delay).spawn();

    let mut funnel = Funnel::new(store, api, config);
    let mut wizard: Option<OnboardingWizard> = None;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = Box::pin(tokio_lines(stdin));

    while let Some(line) = lines.next().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, ' ');
        let command = parts.next().unwrap_or_default();
        let first = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default();

        match command {
            "/quit" | "/exit" => break,
            "/help" => eprintln!("{HELP}"),
            "/go" => {
                wizard = enter(&mut funnel, first, view.clone());
            }
            "/checkout" => {
                let next = funnel.checkout().submit(first, rest);
                wizard = enter(&mut funnel, &next, view.clone());
            }
            "/chat" => {
                let turn = funnel.chat().toggle();
                view.set_visible(funnel.chat().is_visible());
                playback.enqueue(turn);
            }
            "/login" => {
                let outcome = funnel
                    .login(view.clone())
                    .submit(first, secrecy::SecretString::from(rest))
                    .await;
                tracing::debug!(?outcome, "Login finished");
            }
            "/set" | "/pick" | "/unpick" | "/next" | "/back" | "/submit" => {
                let Some(active) = wizard.as_mut() else {
                    println!("  abra /go /onboarding primeiro");
                    continue;
                };
                let result: anyhow::Result<Option<String>> = match command {
                    "/set" => active.set_text(first, rest).map(|_| None).map_err(Into::into),
                    "/pick" => active.toggle_option(first, rest, true).map(|_| None).map_err(Into::into),
                    "/unpick" => active.toggle_option(first, rest, false).map(|_| None).map_err(Into::into),
                    "/next" => {
                        if let StepOutcome::AtLastStep = active.next() {
                            println!("  última etapa: use /submit");
                        }
                        Ok(None)
                    }
                    "/back" => {
                        active.back();
                        Ok(None)
                    }
                    _ => active.submit().await.map(Some).map_err(Into::into),
                };
                match result {
                    Ok(Some(redirect)) => wizard = enter(&mut funnel, &redirect, view.clone()),
                    Ok(None) => {}
                    Err(e) => println!("  ⚠ {e}"),
                }
            }
            _ => {
                let turn = funnel.chat().submit(&line).await;
                playback.enqueue(turn);
            }
        }
    }

    // Let queued messages finish before leaving.
    drop(playback);
    let _ = player.await;

    // Nothing left to resume once the funnel has been cleared.
    if file_store.is_empty() {
        file_store.end()?;
        tracing::info!(session_id = %file_store.session_id(), "Session ended");
    }

    Ok(())
}

/// Enter a route and build the onboarding wizard when it is the onboarding page.
fn enter(funnel: &mut Funnel, path: &str, view: Arc<TerminalView>) -> Option<OnboardingWizard> {
    let route = funnel.enter_route(path);
    println!("→ {path} ({route:?})");
    match route {
        Route::Onboarding => Some(funnel.wizard(FormSchema::landing(), view)),
        _ => None,
    }
}

fn tokio_lines<R>(reader: BufReader<R>) -> impl futures::Stream<Item = String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    futures::stream::unfold(reader.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                None
            }
        }
    })
}
