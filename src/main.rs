use clap::Parser;
use sneedchat::attach::{AttachmentClient, UploadOutcome};
use sneedchat::cli::{self, Args};
use sneedchat::config::Config;
use sneedchat::{ChatClient, InputEvent};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never fight the repainted chat screen.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sneedchat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = cli::merge_config(config, &args);

    if let Some(path) = &args.upload {
        return upload(&config, path).await;
    }

    let initial_room = cli::initial_room(&args, &config);
    let mut client = ChatClient::new(config, args.rows)?;
    client.state.room = initial_room;

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    // Typed lines from the terminal. EOF is a shutdown, same as Ctrl-C.
    let stdin_tx = input_tx.clone();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stdin_tx.send(InputEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = stdin_tx.send(InputEvent::Shutdown);
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = input_tx.send(InputEvent::Shutdown);
        }
    });

    client.run(&mut input_rx).await?;
    Ok(())
}

/// `--upload`: hash, check for an existing copy, upload only when new.
async fn upload(config: &Config, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let base = config
        .site_url
        .clone()
        .ok_or("uploading needs a site URL (positional argument or config file)")?;
    let client = AttachmentClient::new(base);
    match client.submit(path).await? {
        UploadOutcome::AlreadyPresent { hash } => {
            println!("{}: already on the server ({hash})", path.display());
        }
        UploadOutcome::Uploaded { hash } => {
            println!("{}: uploaded ({hash})", path.display());
        }
    }
    Ok(())
}
