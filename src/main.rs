use futures::future::join_all;
use log::error;
use std::env;
use std::process::ExitCode;
use tokio::task::JoinHandle;

use video_recipes::{CacheEntry, ContextConfig, RecipeContext, VideoId};

const USAGE: &str =
    "Usage: video-recipes <fetch <video-id>...|save <video-id>|unsave <video-id>|list [--fetch]>";

const COLD_START_NOTE: &str =
    "Note: the recipe backend may be waking up; the first request can take a minute.";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Get the command from command-line arguments
    let args: Vec<String> = env::args().skip(1).collect();
    let (command, rest) = args.split_first().ok_or(USAGE)?;
    let ids: Vec<VideoId> = rest.iter().map(|id| VideoId::from(id.as_str())).collect();

    let context = RecipeContext::from_config(ContextConfig::load()?)?;

    match command.as_str() {
        "fetch" if !ids.is_empty() => {
            let notifier = spawn_cold_start_note(&context);

            let fetches = ids.iter().map(|id| context.get_or_fetch(id));
            let results = join_all(fetches).await;
            notifier.abort();

            let mut failed = false;
            for (id, result) in ids.iter().zip(results) {
                match result {
                    Ok(recipe) => {
                        let marker = if context.is_saved(id) { " [saved]" } else { "" };
                        println!("# {}{}\n{}", id, marker, recipe.to_text());
                    }
                    Err(e) => {
                        failed = true;
                        eprintln!("{}: {}", id, e);
                    }
                }
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        "save" if ids.len() == 1 => {
            context.save(&ids[0]);
            Ok(ExitCode::SUCCESS)
        }
        "unsave" if ids.len() == 1 => {
            context.unsave(&ids[0]);
            Ok(ExitCode::SUCCESS)
        }
        "list" if rest.is_empty() => {
            // A fresh process has a cold cache, so only ids are known
            for video_id in context.list() {
                println!("{}", video_id);
            }
            Ok(ExitCode::SUCCESS)
        }
        "list" if rest.len() == 1 && rest[0] == "--fetch" => {
            let notifier = spawn_cold_start_note(&context);

            let saved = context.fetch_saved().await;
            notifier.abort();

            for saved in saved {
                let state = match saved.entry {
                    Some(CacheEntry::Ready(recipe)) => recipe.title,
                    Some(CacheEntry::Failed(e)) => format!("(failed: {})", e),
                    _ => "(unavailable)".to_string(),
                };
                println!("{}\t{}", saved.video_id, state);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => Err(USAGE.into()),
    }
}

/// Print the cold-start note as soon as one is issued, while the slow first
/// request is still running.
fn spawn_cold_start_note(context: &RecipeContext) -> JoinHandle<()> {
    let mut notices = context.subscribe_cold_start();
    tokio::spawn(async move {
        if notices.recv().await.is_ok() {
            eprintln!("{}", COLD_START_NOTE);
        }
    })
}
