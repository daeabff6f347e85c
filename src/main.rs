use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotwatch::{
    cli, config, error,
    spotify::history::MAX_LIMIT,
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify in the browser and print a refresh token
    Authorize,

    /// Exchange an authorization code copied from the redirect URL
    Exchange(ExchangeOptions),

    /// Fetch recently played tracks and write table-ready records
    Fetch(FetchOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ExchangeOptions {
    /// The `code` query parameter from the redirect URL
    #[clap(long)]
    pub code: String,
}

#[derive(Parser, Debug, Clone)]
pub struct FetchOptions {
    /// Number of play events to request (1-50)
    #[clap(
        long,
        default_value_t = MAX_LIMIT,
        value_parser = clap::value_parser!(u32).range(1..=MAX_LIMIT as i64)
    )]
    pub limit: u32,

    /// Directory receiving recently_played.json and track_history.json
    #[clap(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Internal user id stamped on every record (overrides SELFOPTICON_USER_ID)
    #[clap(long)]
    pub user_id: Option<String>,

    /// Spotify user id stamped on every record (overrides SPOTIFY_USER_ID)
    #[clap(long)]
    pub spotify_user_id: Option<String>,

    /// Do not print the records table
    #[clap(long)]
    pub quiet: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load .env file. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let settings = match config::Settings::from_env() {
        Ok(s) => s,
        Err(e) => error!("{}", e),
    };

    match cli.command {
        Command::Authorize => cli::authorize(&settings).await,
        Command::Exchange(opt) => cli::exchange(&settings, &opt.code).await,
        Command::Fetch(opt) => {
            cli::fetch(
                &settings,
                cli::FetchArgs {
                    limit: opt.limit,
                    output_dir: opt.output_dir,
                    selfopticon_user_id: opt.user_id,
                    spotify_user_id: opt.spotify_user_id,
                    quiet: opt.quiet,
                },
            )
            .await
        }
        Command::Completions(_) => {}
    }
}
