use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sneedchat")]
#[command(version)]
#[command(about = "Terminal client for the SneedChat forum chat service")]
pub struct Args {
    /// Forum base URL; a #<id> fragment selects the initial room
    pub site: Option<String>,

    /// Room to join on connect (beats the config file and the URL fragment)
    #[arg(long)]
    pub room: Option<u32>,

    /// Path to a TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Socket endpoint as configured, before host/scheme rewriting
    #[arg(long)]
    pub chat_url: Option<String>,

    /// Hash-check and upload an attachment instead of opening the chat
    #[arg(long)]
    pub upload: Option<PathBuf>,

    /// Message viewport height in rows
    #[arg(long, default_value = "25")]
    pub rows: usize,
}

/// Fold CLI flags over the file config; flags win.
pub fn merge_config(mut config: Config, args: &Args) -> Config {
    if let Some(site) = &args.site {
        config.site_url = Some(site.clone());
    }
    if let Some(chat_url) = &args.chat_url {
        config.chat_url = chat_url.clone();
    }
    if let Some(room) = args.room {
        config.room = Some(room);
    }
    config
}

/// The room to join on connect: `--room`, then the site-URL fragment, then
/// the config file's `room` field.
pub fn initial_room(args: &Args, config: &Config) -> Option<u32> {
    args.room.or_else(|| config.initial_room())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["sneedchat"]);
        assert!(args.site.is_none());
        assert!(args.room.is_none());
        assert!(args.config.is_none());
        assert!(args.upload.is_none());
        assert_eq!(args.rows, 25);
    }

    #[test]
    fn test_args_parse_site_positional() {
        let args = Args::parse_from(["sneedchat", "https://forum.example/chat#3"]);
        assert_eq!(args.site.as_deref(), Some("https://forum.example/chat#3"));
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "sneedchat",
            "https://forum.example",
            "--room",
            "7",
            "--config",
            "chat.toml",
            "--chat-url",
            "ws://xf.localhost/rust-chat",
            "--rows",
            "40",
        ]);
        assert_eq!(args.room, Some(7));
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("chat.toml")));
        assert_eq!(args.chat_url.as_deref(), Some("ws://xf.localhost/rust-chat"));
        assert_eq!(args.rows, 40);
    }

    #[test]
    fn test_args_parse_upload() {
        let args = Args::parse_from(["sneedchat", "--upload", "cat.jpg"]);
        assert_eq!(args.upload.as_deref(), Some(std::path::Path::new("cat.jpg")));
    }

    #[test]
    fn test_merge_config_flags_win() {
        let args = Args::parse_from([
            "sneedchat",
            "https://mirror.example",
            "--room",
            "9",
            "--chat-url",
            "ws://other.example/chat",
        ]);
        let config = merge_config(
            Config {
                site_url: Some("https://forum.example".to_string()),
                room: Some(1),
                ..Default::default()
            },
            &args,
        );
        assert_eq!(config.site_url.as_deref(), Some("https://mirror.example"));
        assert_eq!(config.room, Some(9));
        assert_eq!(config.chat_url, "ws://other.example/chat");
    }

    #[test]
    fn test_merge_config_keeps_file_values_without_flags() {
        let args = Args::parse_from(["sneedchat"]);
        let config = merge_config(
            Config {
                site_url: Some("https://forum.example".to_string()),
                room: Some(4),
                ..Default::default()
            },
            &args,
        );
        assert_eq!(config.site_url.as_deref(), Some("https://forum.example"));
        assert_eq!(config.room, Some(4));
    }

    #[test]
    fn test_initial_room_flag_beats_fragment() {
        let args = Args::parse_from(["sneedchat", "--room", "2"]);
        let config = Config {
            site_url: Some("https://forum.example/chat#9".to_string()),
            ..Default::default()
        };
        assert_eq!(initial_room(&args, &config), Some(2));
    }

    #[test]
    fn test_initial_room_fragment_without_flag() {
        let args = Args::parse_from(["sneedchat"]);
        let config = Config {
            site_url: Some("https://forum.example/chat#9".to_string()),
            ..Default::default()
        };
        assert_eq!(initial_room(&args, &config), Some(9));
    }
}
