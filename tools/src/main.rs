//! trial-runner: headless driver for the shelf trial rig.
//!
//! Usage:
//!   trial-runner --scene scene.json --data-dir StreamingAssets --db prefs.db
//!   trial-runner --scene scene.json --data-dir StreamingAssets --db prefs.db --next
//!   trial-runner --scene scene.json --data-dir StreamingAssets --participant 4 --async
//!   trial-runner stock --scene scene.json --asset Assets/Soda.prefab [--slot Slot3]
//!   trial-runner stock --scene scene.json --asset Assets/Soda.prefab --container 17

use anyhow::{Context, Result};
use futures::executor::block_on;
use shelf_trial_core::{
    config::RigConfig,
    error::StockError,
    event::TrialEvent,
    headless::{LoadedScene, MemoryScene, SceneDescription},
    prefs::{PreferenceStore, PARTICIPANT_ID_KEY},
    scene::SceneGraph,
    source::DirSource,
    stocker::{self, AssetPicker, SlotRequest},
    store::RigStore,
    trial_runner::TrialRunner,
};
use std::env;

/// Answers every file dialog with the `--asset` argument.
struct ArgPicker {
    asset: Option<String>,
}

impl AssetPicker for ArgPicker {
    fn pick(&mut self, title: &str, start_dir: &str, _extensions: &[&str]) -> Option<String> {
        log::debug!("{title} (starting in {start_dir})");
        self.asset.clone()
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let scene_path = arg_value(&args, "--scene").unwrap_or("scene.json");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let config = match arg_value(&args, "--config") {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    let scene_text = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Cannot read {scene_path}"))?;
    let loaded = SceneDescription::from_json(&scene_text)?.build()?;

    let mut store = RigStore::open(db)?;
    store.migrate()?;

    if args.get(1).map(String::as_str) == Some("stock") {
        run_stock(&args, loaded.scene, &mut store, &config)
    } else {
        run_trials(&args, loaded, &mut store, config)
    }
}

fn run_trials(args: &[String], loaded: LoadedScene, store: &mut RigStore, config: RigConfig) -> Result<()> {
    let data_dir = arg_value(args, "--data-dir").unwrap_or("./StreamingAssets");
    let use_async = args.iter().any(|a| a == "--async");
    let next = args.iter().any(|a| a == "--next");
    let participant: Option<i32> = parsed_arg(args, "--participant")?;

    let shelves = loaded
        .shelves
        .context("scene file defines no shelves; add a \"shelves\" list with four entries")?;

    println!("Shelf trial rig: trial-runner");
    println!("  data_dir:  {data_dir}");
    println!("  db:        {}", store.path().unwrap_or(":memory:"));
    println!("  fetch:     {}", if use_async { "async" } else { "sync" });
    println!();

    let session_id = format!("session-{}", unix_seconds());
    let starting_participant = store.get_int(PARTICIPANT_ID_KEY, 1);
    store.insert_session(&session_id, starting_participant, env!("CARGO_PKG_VERSION"), unix_seconds())?;

    let source = DirSource::new(data_dir);
    let (mut runner, events) = if use_async {
        block_on(TrialRunner::start_async(loaded.scene, &mut *store, shelves, config, &source))
    } else {
        TrialRunner::start(loaded.scene, &mut *store, shelves, config, &source)
    };
    record(&runner, &session_id, &events)?;

    if let Some(p) = participant {
        let events = runner.set_participant(p)?;
        record(&runner, &session_id, &events)?;
    }
    if next {
        let events = runner.advance()?;
        record(&runner, &session_id, &events)?;
    }

    print_summary(&runner, &session_id)
}

fn record(
    runner: &TrialRunner<MemoryScene, &mut RigStore>,
    session_id: &str,
    events: &[TrialEvent],
) -> Result<()> {
    runner.prefs().append_trial_events(
        session_id,
        runner.participant_id,
        runner.trial_number,
        events,
    )?;
    Ok(())
}

fn print_summary(runner: &TrialRunner<MemoryScene, &mut RigStore>, session_id: &str) -> Result<()> {
    let scene = runner.scene();
    let logged = runner.prefs().events_for_session(session_id)?;
    let finished = matches!(logged.last(), Some(e) if e.event_type == "experiment_finished");

    println!("=== TRIAL ===");
    println!("  session:      {session_id}");
    println!("  participant:  {}", runner.participant_id);
    println!("  trial:        {}", runner.trial_number);
    println!("  prices:       {}", runner.prices().len());
    println!("  trials:       {}", runner.trials().len());
    println!("  inventory:    {}", runner.inventory().len());
    println!();
    println!("=== SHELVES ===");
    for (i, shelf) in runner.shelves().iter().enumerate() {
        let label = shelf.label.map(|l| scene.label_text(l)).unwrap_or("(no label)");
        let shown = runner
            .active_set()
            .iter()
            .filter(|obj| scene.world_pose(**obj) == scene.world_pose(shelf.anchor))
            .map(|obj| scene.name(*obj))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  shelf {}: {:<8} {}", i + 1, label, shown);
    }
    if finished {
        println!();
        println!("  (no trial data, experiment finished?)");
    }
    println!();
    println!("  events logged: {}", logged.len());
    Ok(())
}

fn run_stock(args: &[String], mut scene: MemoryScene, store: &mut RigStore, config: &RigConfig) -> Result<()> {
    let mut picker = ArgPicker { asset: arg_value(args, "--asset").map(str::to_string) };

    let container: Option<i32> = parsed_arg(args, "--container")?;
    if let Some(product_id) = container {
        return match stocker::create_product_container(&mut scene, store, &mut picker, product_id, config) {
            Ok(Some(created)) => {
                println!(
                    "Created product {product_id} '{}' on shelf '{}'",
                    scene.name(created.container),
                    scene.name(created.shelf)
                );
                Ok(())
            }
            Ok(None) => {
                println!("Cancelled.");
                Ok(())
            }
            Err(e) => report(e),
        };
    }

    let request = SlotRequest::from_input(arg_value(args, "--slot").unwrap_or(""));
    match stocker::stock_shelf(&mut scene, store, &mut picker, &request, config) {
        Ok(Some(stocked)) => {
            println!(
                "Stocked '{}' into '{}'",
                scene.name(stocked.instance),
                scene.name(stocked.slot)
            );
            match stocked.z_push {
                Some(push) => println!("  z push: {push:.4}m"),
                None => println!("  z push: none (no renderers)"),
            }
            Ok(())
        }
        Ok(None) => {
            println!("Cancelled.");
            Ok(())
        }
        Err(e) => report(e),
    }
}

/// Operator-facing failures are printed like a dialog; everything else propagates.
fn report(err: StockError) -> Result<()> {
    match err {
        StockError::Rig(e) => Err(e.into()),
        other => {
            eprintln!("Error: {other}");
            std::process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `Ok(None)` when the flag is absent; a value that does not parse is an error.
fn parsed_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    arg_value(args, flag)
        .map(|v| v.parse::<T>().with_context(|| format!("{flag}: cannot parse '{v}'")))
        .transpose()
}

fn unix_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn numeric_flags_parse_or_fail_loudly() {
        let ok = args(&["trial-runner", "--participant", "4"]);
        assert_eq!(parsed_arg::<i32>(&ok, "--participant").unwrap(), Some(4));
        assert_eq!(parsed_arg::<i32>(&ok, "--container").unwrap(), None);

        let bad = args(&["trial-runner", "--participant", "four"]);
        let err = parsed_arg::<i32>(&bad, "--participant").unwrap_err();
        assert!(err.to_string().contains("'four'"));
    }
}
