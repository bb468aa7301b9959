use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dsk::host::memory::MemoryHost;

#[derive(Parser, Debug)]
#[command(name = "dsk", version)]
struct Cli {
    /// Log engine decisions to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the keyer dock stored in a scene-collection JSON file.
    Inspect(InspectArgs),
    /// Drive a dock against the in-memory host from a JSON scenario.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Scene-collection JSON (an object holding the dock keys).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Alternate sink name; the main mixer when omitted.
    #[arg(long)]
    sink: Option<String>,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Write the resulting dock blob here.
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize)]
struct Scenario {
    #[serde(default)]
    sink: Option<String>,
    #[serde(default)]
    scenes: Vec<String>,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    transitions: Vec<String>,
    /// Dock blob loaded before the first step.
    #[serde(default)]
    load: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    AddKeyer { name: String },
    RenameKeyer { name: String, to: String },
    RemoveKeyer { name: String },
    BaseChannel { channel: u32 },
    AddScene { keyer: String, scene: String },
    RemoveScene { keyer: String, scene: String },
    Select { keyer: String, scene: String },
    SelectNone { keyer: String },
    Tie { keyer: String, tie: bool },
    Transition {
        keyer: String,
        role: dsk::TransitionRole,
        name: String,
        #[serde(default = "default_duration_ms")]
        duration_ms: i64,
    },
    HideAfter { keyer: String, ms: u64 },
    Exclude { keyer: String, scene: String },
    Include { keyer: String, scene: String },
    Program { scene: String },
    RenameSource { from: String, to: String },
    RemoveSource { name: String },
    /// Run hide-after deadlines as if `ms` had passed.
    Wait { ms: u64 },
}

fn default_duration_ms() -> i64 {
    i64::from(dsk::TransitionDuration::DEFAULT_MS)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("dsk=debug"))
            .with_writer(std::io::stderr)
            .init();
    }
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn sink_from(name: Option<String>) -> dsk::OutputSink {
    match name {
        Some(name) => dsk::OutputSink::Alternate(name),
        None => dsk::OutputSink::Main,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse JSON '{}'", path.display()))?;
    Ok(value)
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let blob: serde_json::Map<String, serde_json::Value> = read_json(&args.in_path)?;
    let sink = sink_from(args.sink);
    let state = dsk::DockState::from_json(&blob, &sink)?;

    let base = match state.channel {
        Some(raw) => sink.clamp_base_channel(raw),
        None => sink.min_base_channel(),
    };
    println!("output {sink}: base channel {base}");
    let keyers = state.keyers.unwrap_or_default();
    if keyers.is_empty() {
        println!("  (no keyers saved; a default keyer is created on load)");
    }
    for (i, keyer) in keyers.iter().enumerate() {
        let channel = base + u32::try_from(i).unwrap_or(u32::MAX);
        println!("  [{channel}] {}", keyer.name);
        let scenes: Vec<&str> = keyer.scenes.iter().map(|s| s.name.as_str()).collect();
        println!("    scenes: {}", scenes.join(", "));
        if !keyer.scene.is_empty() {
            println!("    selected: {}", keyer.scene);
        }
        for (role, name, ms) in [
            ("match", &keyer.transition, keyer.transition_duration),
            ("show", &keyer.show_transition, keyer.show_transition_duration),
            ("hide", &keyer.hide_transition, keyer.hide_transition_duration),
        ] {
            if !name.is_empty() {
                let ms = dsk::TransitionDuration::clamped(ms);
                println!("    {role}: {name} ({} ms)", ms.as_millis());
            }
        }
        if keyer.tie {
            println!("    tie: on");
        }
        if !keyer.exclude_scenes.is_empty() {
            let excluded: Vec<&str> = keyer.exclude_scenes.iter().map(|s| s.name.as_str()).collect();
            println!("    excluded: {}", excluded.join(", "));
        }
        if keyer.hide_after > 0 {
            println!("    hide after: {} ms", keyer.hide_after);
        }
    }
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let scenario: Scenario = read_json(&args.in_path)?;
    let host = MemoryHost::new();
    for name in &scenario.scenes {
        host.add_scene(name);
    }
    for name in &scenario.inputs {
        host.add_input(name);
    }
    for name in &scenario.transitions {
        host.add_transition_template(name);
    }

    let sink = sink_from(scenario.sink.clone());
    let mut dock = dsk::Dock::new(
        sink.clone(),
        host.context(),
        dsk::DockConfig::for_sink(&sink),
    )?;
    if let Some(blob) = &scenario.load {
        dock.load_json(blob).context("load dock blob")?;
    }

    for (i, step) in scenario.steps.iter().enumerate() {
        run_step(&mut dock, &host, step).with_context(|| format!("step {i}: {step:?}"))?;
    }

    for keyer in dock.keyers() {
        let content = host.channel_content(keyer.target());
        println!("{} [{}] {content}", keyer.name(), keyer.target());
    }
    for event in host.take_events() {
        println!("{}", serde_json::to_string(&event)?);
    }

    if let Some(path) = &args.save {
        let mut blob = serde_json::Map::new();
        dock.save_json(&mut blob)?;
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(blob))?;
        std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn run_step(dock: &mut dsk::Dock, host: &MemoryHost, step: &Step) -> anyhow::Result<()> {
    match step {
        Step::AddKeyer { name } => {
            dock.add_keyer(name)?;
        }
        Step::RenameKeyer { name, to } => dock.rename_keyer(name, to)?,
        Step::RemoveKeyer { name } => dock.remove_keyer(name)?,
        Step::BaseChannel { channel } => dock.set_base_channel(*channel)?,
        Step::AddScene { keyer, scene } => {
            if !dock.add_scene(keyer, scene)? {
                anyhow::bail!("scene '{scene}' not found");
            }
        }
        Step::RemoveScene { keyer, scene } => {
            dock.remove_scene(keyer, scene)?;
        }
        Step::Select { keyer, scene } => {
            if !dock.switch_scene(keyer, scene)? {
                anyhow::bail!("scene '{scene}' is not in keyer '{keyer}'");
            }
        }
        Step::SelectNone { keyer } => {
            dock.keyer_mut(keyer)?.select_none();
        }
        Step::Tie { keyer, tie } => dock.set_tie(keyer, *tie)?,
        Step::Transition {
            keyer,
            role,
            name,
            duration_ms,
        } => dock.set_transition(keyer, *role, name, *duration_ms)?,
        Step::HideAfter { keyer, ms } => {
            let delay = (*ms > 0).then(|| Duration::from_millis(*ms));
            dock.keyer_mut(keyer)?.set_hide_after(delay);
        }
        Step::Exclude { keyer, scene } => {
            dock.add_exclude_scene(keyer, scene)?;
        }
        Step::Include { keyer, scene } => {
            dock.remove_exclude_scene(keyer, scene)?;
        }
        Step::Program { scene } => dock.scene_changed(scene),
        Step::RenameSource { from, to } => {
            if host.rename_source(from, to) {
                dock.scene_renamed(from, to);
            }
        }
        Step::RemoveSource { name } => {
            if host.remove_source(name).is_some() {
                dock.scene_removed(name);
            }
        }
        Step::Wait { ms } => {
            let now = Instant::now()
                .checked_add(Duration::from_millis(*ms))
                .with_context(|| format!("wait of {ms} ms is out of range"))?;
            dock.tick(now);
        }
    }
    Ok(())
}
