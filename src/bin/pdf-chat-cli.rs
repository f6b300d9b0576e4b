//! Interactive terminal client for the PDF chat backend. Owns the input
//! line and the rendering; all state lives in [`ChatSession`].

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use pdf_chat::client::ApiClient;
use pdf_chat::session::{ChatSession, Message, MessageKind, StatusKind};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let base_url =
        std::env::var("PDF_CHAT_API").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let mut session = ChatSession::new(ApiClient::new(base_url.clone())?);

    println!("pdf-chat ({base_url})");
    print_help();
    session.refresh_documents().await;
    render_documents(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            prompt();
            continue;
        }
        if let Some(rest) = line.strip_prefix('/') {
            let mut parts = rest.splitn(2, ' ');
            let cmd = parts.next().unwrap_or_default();
            let arg = parts.next().unwrap_or_default().trim().to_string();
            match cmd {
                "quit" | "exit" => break,
                "help" => print_help(),
                "list" => {
                    session.refresh_documents().await;
                    render_documents(&session);
                }
                "upload" => upload(&mut session, &arg).await,
                "select" => select(&mut session, &arg),
                "delete" => delete(&mut session, &arg, &mut lines).await?,
                other => println!("Unknown command: /{other} (try /help)"),
            }
        } else {
            if session.selected().is_none() {
                println!("Select or upload a document first (/list, /upload <path>).");
                prompt();
                continue;
            }
            println!("assistant is typing...");
            session.send_question(&line).await;
            if let Some(msg) = session.messages().last() {
                render_message(msg);
            }
        }
        render_banner(&session);
        prompt();
    }
    Ok(())
}

fn print_help() {
    println!("commands: /list, /upload <path>, /select <n|id>, /delete <n|id>, /help, /quit");
    println!("anything else is asked as a question about the selected document");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn render_documents(session: &ChatSession) {
    if session.documents().is_empty() {
        println!("No documents uploaded yet.");
        return;
    }
    for (i, doc) in session.documents().iter().enumerate() {
        let marker = if session.selected() == Some(doc.pdf_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}. {} ({} chunks)",
            i + 1,
            doc.pdf_name,
            doc.total_chunks
        );
    }
}

fn render_message(msg: &Message) {
    match msg.kind {
        MessageKind::User => println!("you: {}", msg.content),
        MessageKind::Assistant => {
            println!("assistant: {}", msg.content);
            if !msg.sources.is_empty() {
                let cites: Vec<String> = msg.sources.iter().map(|s| s.display()).collect();
                println!("  sources: {}", cites.join(", "));
            }
        }
        MessageKind::System => println!("* {}", msg.content),
        MessageKind::Error => println!("! {}", msg.content),
    }
}

fn render_banner(session: &ChatSession) {
    if let Some(banner) = session.active_banner() {
        match banner.kind {
            StatusKind::Success => println!("[ok] {}", banner.text),
            StatusKind::Error => println!("[error] {}", banner.text),
        }
    }
}

/// Resolve a 1-based list position or a raw document id.
fn resolve_id(session: &ChatSession, arg: &str) -> Option<String> {
    if let Ok(n) = arg.parse::<usize>() {
        if n >= 1 && n <= session.documents().len() {
            return Some(session.documents()[n - 1].pdf_id.clone());
        }
        return None;
    }
    session
        .documents()
        .iter()
        .find(|d| d.pdf_id == arg)
        .map(|d| d.pdf_id.clone())
}

async fn upload(session: &mut ChatSession, arg: &str) {
    if arg.is_empty() {
        println!("usage: /upload <path-to-pdf>");
        return;
    }
    let path = PathBuf::from(arg);
    let result = session
        .upload_file(&path, |pct| {
            print!("\ruploading... {pct}%");
            let _ = std::io::stdout().flush();
        })
        .await;
    println!();
    match result {
        Ok(()) => {
            if let Some(msg) = session.messages().last() {
                render_message(msg);
            }
        }
        // Local validation alert; nothing was sent.
        Err(rejection) => println!("! {rejection}"),
    }
}

fn select(session: &mut ChatSession, arg: &str) {
    match resolve_id(session, arg) {
        Some(id) => {
            session.select_document(&id);
            if let Some(msg) = session.messages().last() {
                render_message(msg);
            }
        }
        None => println!("No such document: {arg}"),
    }
}

async fn delete(
    session: &mut ChatSession,
    arg: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let Some(id) = resolve_id(session, arg) else {
        println!("No such document: {arg}");
        return Ok(());
    };
    let name = session
        .documents()
        .iter()
        .find(|d| d.pdf_id == id)
        .map(|d| d.pdf_name.clone())
        .unwrap_or_else(|| id.clone());
    print!("Delete \"{name}\"? [y/N] ");
    let _ = std::io::stdout().flush();
    if let Some(answer) = lines.next_line().await? {
        if answer.trim().eq_ignore_ascii_case("y") {
            session.delete_document(&id).await;
            render_documents(session);
        } else {
            println!("Cancelled.");
        }
    }
    Ok(())
}
