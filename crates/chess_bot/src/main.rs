//! chessbot CLI
//!
//! Serve the board/command HTTP API, play from the console, or print a board.

use anyhow::{bail, Context, Result};
use chess_bot::{build_router, console, logging::init_logging, AppState};
use chess_session::{BoardSnapshot, ChessConfig, SessionEngine};
use std::env;
use std::io;
use std::path::PathBuf;

fn print_usage() {
    println!("chessbot - persistent chess games against a UCI engine");
    println!();
    println!("Usage:");
    println!("  chessbot serve [--config FILE]");
    println!("  chessbot play <opponent> [--config FILE]");
    println!("  chessbot board <opponent> [--config FILE] [--json]");
    println!();
    println!("Environment:");
    println!("  CHESS_ENGINE      engine executable");
    println!("  CHESS_THINK_TIME  think time per move in milliseconds");
    println!("  CHESS_NICK        engine's name in transcripts");
    println!("  RUST_LOG          log filter (default: info)");
}

struct Options {
    positional: Vec<String>,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        positional: Vec::new(),
        config: None,
        json: false,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).context("--config needs a file")?;
                options.config = Some(PathBuf::from(path));
                i += 1;
            }
            "--json" => options.json = true,
            other => options.positional.push(other.to_string()),
        }
        i += 1;
    }
    Ok(options)
}

fn load(options: &Options) -> Result<(ChessConfig, SessionEngine)> {
    let config = ChessConfig::load(options.config.as_deref()).context("loading configuration")?;
    let engine = SessionEngine::from_config(&config).context("opening game store")?;
    Ok((config, engine))
}

fn opponent_arg(options: &Options) -> Result<&str> {
    match options.positional.first() {
        Some(opponent) => Ok(opponent.as_str()),
        None => bail!("missing <opponent>"),
    }
}

async fn serve(options: &Options) -> Result<()> {
    let (config, engine) = load(options)?;
    let state = AppState::new(engine, &config.board_url);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(
        bind = %config.server.bind,
        engine = %config.engine.path.display(),
        "chessbot v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

fn play(options: &Options) -> Result<()> {
    let opponent = opponent_arg(options)?;
    let (config, engine) = load(options)?;
    println!("playing as {opponent}; type help for commands, quit to stop");
    let stdin = io::stdin();
    console::run(&engine, opponent, &config.board_url, stdin.lock(), io::stdout())
        .context("console I/O failed")
}

fn board(options: &Options) -> Result<()> {
    let opponent = opponent_arg(options)?;
    let (_config, engine) = load(options)?;
    let session = engine
        .board(opponent)
        .with_context(|| format!("no game for {opponent}"))?;
    let snapshot = BoardSnapshot::from_session(&session);
    if options.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", snapshot.to_ascii());
        println!(
            "round {} · difficulty {} · {} to move · {}",
            snapshot.round, snapshot.difficulty, snapshot.side_to_move, snapshot.result
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }
    let options = parse_options(&args[2..])?;

    match args[1].as_str() {
        "serve" => serve(&options).await,
        "play" => tokio::task::block_in_place(|| play(&options)),
        "board" => board(&options),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command `{other}`")
        }
    }
}
