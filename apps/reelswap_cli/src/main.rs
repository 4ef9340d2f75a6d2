//! reelswap-cli - 命令行演示
//!
//! 用模拟引擎执行一段 JSON 脚本，打印控制器发出的状态事件

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use log::info;
use reelswap_core::{ConfigError, PlayerCommand, PlayerConfig, PlayerError};
use reelswap_sim::{SimLibrary, SimMediaEntry, SimQuirks, SimRig};
use serde::Deserialize;

const DEMO_SCRIPT: &str = r#"{
  "media": [
    { "location": "persistent", "path": "Download/intro.mp4", "duration_ms": 4000 },
    { "location": "bundled", "path": "loop.mp4", "duration_ms": 2000 }
  ],
  "quirks": { "silent_seek_below_ms": 60 },
  "steps": [
    { "cmd": "open", "source": "intro.mp4" },
    { "wait": 3 },
    { "cmd": "play" },
    { "wait": 24 },
    { "cmd": "open", "source": "loop.mp4", "defer_swap": true },
    { "wait": 3 },
    { "cmd": "seek", "frame": 24, "role": "standby" },
    { "wait": 3 },
    { "cmd": "stage", "start": 1, "end": 24, "looping": true },
    { "wait": 50 },
    { "cmd": "stage", "start": 12, "end": 12 },
    { "wait": 4 },
    { "cmd": "seek", "frame": 13 },
    { "wait": 4 },
    { "cmd": "close" },
    { "cmd": "release" }
  ]
}"#;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    media: Vec<SimMediaEntry>,
    #[serde(default)]
    quirks: SimQuirks,
    #[serde(default)]
    tick_ms: Option<f64>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Wait { wait: u32 },
    Command(PlayerCommand),
}

struct Options {
    config: PlayerConfig,
    print_frames: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    let script = match args[1].as_str() {
        "demo" => serde_json::from_str::<Script>(DEMO_SCRIPT).map_err(CliError::from),
        "run" => match args.get(2) {
            Some(path) if !path.starts_with("--") => load_script(Path::new(path)),
            _ => usage(&args[0]),
        },
        other => {
            eprintln!("Unknown command: {}", other);
            std::process::exit(1);
        }
    };

    let result = script.and_then(|script| run_script(script, &options));
    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(3);
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {} run <script.json> [--config <config.json>] [--frames]", program);
    eprintln!("  {} demo [--config <config.json>] [--frames]", program);
    std::process::exit(1);
}

fn parse_options(args: &[String]) -> Result<Options, CliError> {
    let mut options = Options {
        config: PlayerConfig::default(),
        print_frames: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or(ConfigError::Invalid("--config needs a path"))?;
                options.config = PlayerConfig::load(path)?;
            }
            "--frames" => options.print_frames = true,
            _ => {}
        }
    }
    Ok(options)
}

fn load_script(path: &Path) -> Result<Script, CliError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn run_script(script: Script, options: &Options) -> Result<(), CliError> {
    let library = SimLibrary::from_entries(script.media);
    info!("Loaded {} media entries", library.len());

    let mut rig = SimRig::new(options.config.clone(), library, script.quirks)?;
    if let Some(tick_ms) = script.tick_ms {
        rig = rig.with_tick_ms(tick_ms);
    }
    let events = rig.player.status_events();

    let last_frame = Rc::new(RefCell::new(None));
    if options.print_frames {
        let last = last_frame.clone();
        rig.player.subscribe_frame_tick(move |frame| {
            *last.borrow_mut() = Some(frame);
        });
    }

    for step in script.steps {
        match step {
            Step::Wait { wait } => {
                for _ in 0..wait {
                    rig.step();
                    if let Some(frame) = last_frame.borrow_mut().take() {
                        println!("[{:>5}] frame {}", rig.ticks(), frame);
                    }
                    for event in events.try_iter() {
                        println!("[{:>5}] {:?}", rig.ticks(), event);
                    }
                }
            }
            Step::Command(command) => {
                println!("[{:>5}] > {:?}", rig.ticks(), command);
                rig.player.apply(command);
                for event in events.try_iter() {
                    println!("[{:>5}] {:?}", rig.ticks(), event);
                }
            }
        }
    }

    info!("Script finished after {} ticks", rig.ticks());
    Ok(())
}
