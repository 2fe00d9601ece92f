//! services/client/src/bin/studychat.rs
//!
//! A thin command-line shell over the stores. All state logic lives in the
//! library; this binary only wires the context together, dispatches one
//! action per invocation, and prints the resulting snapshots.

use bytes::Bytes;
use client_lib::{
    config::Config,
    context::AppContext,
    error::ClientError,
    adapters::{FileTokenStore, HttpApi},
};
use std::sync::Arc;
use studychat_core::ports::PortError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: studychat <command>
  register <email> <password>
  login <email> <password>
  logout
  whoami
  docs
  upload <path> [title]
  rm <document-id>
  download <document-id> <output-path>
  chat <document-id> <question>
  prefs";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            config.log_level.to_string(),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- 2. Build the Transport and the Context ---
    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let api = Arc::new(HttpApi::new(&config.api_base_url, tokens.clone())?);
    let ctx = AppContext::new(api, tokens);

    // --- 3. Dispatch the Command ---
    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = run(&ctx, &args).await;
    if let Err(ClientError::Port(ref e)) = outcome {
        ctx.absorb_error(e);
    }
    outcome
}

async fn run(ctx: &AppContext, args: &[String]) -> Result<(), ClientError> {
    match args.first().map(String::as_str) {
        Some("register") if args.len() == 3 => {
            let message = ctx.session.register(&args[1], &args[2]).await?;
            println!("{}", message);
        }
        Some("login") if args.len() == 3 => {
            ctx.session.login(&args[1], &args[2]).await;
            let session = ctx.session.snapshot();
            if let Some(error) = session.error {
                return Err(ClientError::Internal(error));
            }
            let user = session.user.map(|u| u.email).unwrap_or_default();
            println!("Logged in as {}", user);
        }
        Some("logout") => {
            ctx.session.logout();
            println!("Logged out");
        }
        Some("whoami") => {
            ctx.session.fetch_user().await;
            let session = ctx.session.snapshot();
            match session.user {
                Some(user) => println!("{} ({})", user.email, user.id),
                None => println!(
                    "{}",
                    session.error.unwrap_or_else(|| "Not logged in".to_string())
                ),
            }
        }
        Some("docs") => {
            ctx.documents.fetch_documents().await;
            let state = ctx.documents.snapshot();
            if let Some(error) = state.error {
                return Err(ClientError::Internal(error));
            }
            for doc in state.documents {
                println!("{}  {:>9}B  {}", doc.id, doc.file_size, doc.title);
            }
        }
        Some("upload") if args.len() >= 2 => {
            let path = std::path::Path::new(&args[1]);
            let bytes = Bytes::from(tokio::fs::read(path).await?);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.pdf");
            let title = args.get(2).map(String::as_str);
            let doc = ctx
                .documents
                .upload_new_document(file_name, bytes, title)
                .await?;
            ctx.documents.clear_upload_progress();
            println!("Uploaded {} as {}", doc.title, doc.id);
        }
        Some("rm") if args.len() == 2 => {
            ctx.documents.remove_document(&args[1]).await?;
            println!("Deleted {}", args[1]);
        }
        Some("download") if args.len() == 3 => {
            let bytes = ctx.documents.download_document(&args[1]).await?;
            tokio::fs::write(&args[2], &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), args[2]);
        }
        Some("chat") if args.len() == 3 => {
            let conversation = ctx.chat.start_conversation(&args[1], None).await?;
            info!("Conversation {} started", conversation.id);
            ctx.chat.send_user_message(&args[2]).await;

            let state = ctx.chat.snapshot();
            if let Some(error) = state.error {
                return Err(ClientError::Internal(error));
            }
            for entry in state.messages {
                println!("[{:?}] {}", entry.message.role, entry.message.content);
                for citation in entry.message.citations.unwrap_or_default() {
                    println!("    p.{}: {}", citation.page, citation.text);
                }
            }
        }
        Some("prefs") => {
            ctx.preferences.fetch_preferences().await;
            let state = ctx.preferences.snapshot();
            if let Some(error) = state.error {
                return Err(ClientError::Internal(error));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&state.preferences)
                    .map_err(|e| ClientError::Internal(e.to_string()))?
            );
        }
        _ => {
            eprintln!("{}", USAGE);
        }
    }
    Ok(())
}
