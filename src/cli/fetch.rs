use std::{path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{config::Settings, error, info, spotify, success, utils, warning, watch};

/// Options of the `fetch` command.
pub struct FetchArgs {
    pub limit: u32,
    pub output_dir: PathBuf,
    pub selfopticon_user_id: Option<String>,
    pub spotify_user_id: Option<String>,
    pub quiet: bool,
}

/// Runs one fetch-and-map cycle and writes its artifacts.
///
/// Any failure ends the process with exit code 1 before anything is
/// written, so no partial output is ever left behind.
pub async fn fetch(settings: &Settings, args: FetchArgs) {
    let credential = match settings.credential() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let ids = match settings.user_ids(args.selfopticon_user_id, args.spotify_user_id) {
        Ok(ids) => ids,
        Err(e) => error!("{}", e),
    };

    let http = match spotify::http_client() {
        Ok(c) => c,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };

    let pb = spinner("Fetching recently played tracks...");
    let cycle = match watch::run_cycle(&http, &settings.endpoints, &credential, args.limit, &ids)
        .await
    {
        Ok(cycle) => {
            pb.finish_and_clear();
            cycle
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Fetch failed ({}): {}", e.kind(), e);
        }
    };

    if cycle.refreshes > 1 {
        info!("Access token expired mid-run and was refreshed.");
    }

    if cycle.rotated_refresh_token(&credential) {
        warning!(
            "Spotify rotated the refresh token. Update your .env file:\nSPOTIFY_REFRESH_TOKEN={}",
            cycle.credential.refresh_token
        );
    }

    match watch::write_output(&args.output_dir, &cycle).await {
        Ok((raw_path, records_path)) => {
            success!(
                "Mapped {} play events. Wrote {} and {}",
                cycle.records.len(),
                raw_path.display(),
                records_path.display()
            );
        }
        Err(e) => error!("Cannot write output ({}): {}", e.kind(), e),
    }

    if !args.quiet && !cycle.records.is_empty() {
        let table = Table::new(utils::build_table_rows(&cycle.records));
        println!("{}", table);
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
