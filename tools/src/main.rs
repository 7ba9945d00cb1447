//! hearth-runner: headless frame loop for the hearth.
//!
//! Usage:
//!   hearth-runner --seed 12345 --seconds 120 --frame-ms 16
//!   hearth-runner --time-scale 2.5 --config hearth.json --audio
//!   hearth-runner --ipc-mode
//!
//! Built with `--features device-audio`, `--audio` plays the crackle on the
//! default output device and paces the frames in real time.

#[cfg(feature = "device-audio")]
mod device_output;

use anyhow::Result;
use hearth_core::{
    audio_output::{AudioOutput, OfflineOutput},
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    event::SimEvent,
    view::{FrameView, PresentationSink},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frame { real_ms: f64 },
    Run { seconds: f64 },
    Command { cmd: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct IpcReply<'a> {
    view: &'a FrameView,
    events: &'a [SimEvent],
}

/// One status line per frame shown, overwritten in place.
struct TerminalSink {
    frames_shown: u64,
}

impl PresentationSink for TerminalSink {
    fn present(&mut self, view: &FrameView) {
        self.frames_shown += 1;
        let cooling: Vec<String> = view
            .actions
            .iter()
            .filter(|a| a.cooldown_fraction > 0.0)
            .map(|a| format!("{}:{:.0}%", a.action.name(), a.cooldown_fraction * 100.0))
            .collect();
        println!(
            "  t={:>7.1}s {:>5} fuel {:>4} [{}] logs={} wood={} coins={} food={} energy={}% {}",
            view.sim_time / 1000.0,
            view.speed_label,
            view.fuel_readout,
            view.ember_label,
            view.log_count,
            view.wallet.wood,
            view.wallet.coins,
            view.wallet.food,
            view.wallet.energy_percent,
            cooling.join(" "),
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let seconds = parse_arg(&args, "--seconds", 60.0f64);
    let frame_ms = parse_arg(&args, "--frame-ms", 1000.0f64 / 60.0);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let audio = args.iter().any(|a| a == "--audio");
    let time_scale = args
        .windows(2)
        .find(|w| w[0] == "--time-scale")
        .map(|w| w[1].clone());
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let output = open_output(config.crackle.sample_rate, audio);
    let realtime = output.as_any().downcast_ref::<OfflineOutput>().is_none();
    let mut engine = SimEngine::build(seed, config, output)?;
    if let Some(raw) = time_scale {
        engine.set_time_scale_text(&raw);
    }
    if audio {
        engine.toggle_audio();
    }

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        println!("Hearth — hearth-runner");
        println!("  seed:       {seed}");
        println!("  seconds:    {seconds}");
        println!("  frame_ms:   {frame_ms:.2}");
        println!("  time scale: {}", engine.view().speed_label);
        println!();
        run_batch(&mut engine, seconds, frame_ms, realtime);
    }

    Ok(())
}

/// The default device when asked for audio and one is available,
/// otherwise an in-memory mixer.
#[cfg(feature = "device-audio")]
fn open_output(sample_rate: u32, audio: bool) -> Box<dyn AudioOutput> {
    if audio {
        match device_output::DeviceOutput::open(sample_rate) {
            Ok(device) => {
                log::info!("crackle on the default output device at {sample_rate} Hz");
                return Box::new(device);
            }
            Err(e) => log::warn!("no output device ({e}), mixing offline"),
        }
    }
    Box::new(OfflineOutput::new(sample_rate))
}

#[cfg(not(feature = "device-audio"))]
fn open_output(sample_rate: u32, _audio: bool) -> Box<dyn AudioOutput> {
    Box::new(OfflineOutput::new(sample_rate))
}

/// Play `seconds` of real time, keeping the fire fed the way an
/// attentive player would, and print one status line per real second.
/// `realtime` waits on the wall clock between frames instead of
/// simulating them back to back.
fn run_batch(engine: &mut SimEngine, seconds: f64, frame_ms: f64, realtime: bool) {
    let mut sink = TerminalSink { frames_shown: 0 };
    let mut meter = AudioMeter::default();
    let mut all_events: Vec<SimEvent> = engine.startup_events().to_vec();
    let started = Instant::now();

    let whole_seconds = seconds.max(0.0).ceil() as u64;
    for second in 0..whole_seconds {
        if realtime {
            all_events.extend(run_second_on_wall_clock(engine, started, second, frame_ms));
        } else {
            all_events.extend(engine.run_for(1000.0, frame_ms));
        }
        meter.drain(engine);
        for command in autopilot(engine) {
            all_events.extend(engine.trigger(&command));
        }
        engine.render(&mut sink);
    }

    print_summary(engine, &all_events, sink.frames_shown);
    meter.print(engine);
}

/// Drive frames from the host clock until `second + 1` real seconds have
/// passed since `started`.
fn run_second_on_wall_clock(
    engine: &mut SimEngine,
    started: Instant,
    second: u64,
    frame_ms: f64,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let until = Duration::from_secs(second + 1);
    let pause = Duration::from_secs_f64(frame_ms.max(1.0) / 1000.0);
    loop {
        let elapsed = started.elapsed();
        events.extend(engine.frame(elapsed.as_secs_f64() * 1000.0));
        if elapsed >= until {
            return events;
        }
        thread::sleep(pause);
    }
}

/// Stoke when the fire runs low, keep wood and food stocked, work for
/// coins, eat when tired. Rejected commands cost nothing.
fn autopilot(engine: &SimEngine) -> Vec<PlayerCommand> {
    let view = engine.view();
    let mut commands = Vec::new();
    if view.fuel < 40.0 {
        commands.push(PlayerCommand::AddLog);
    }
    if view.wallet.energy_percent < 40 {
        commands.push(PlayerCommand::Eat);
    }
    if view.wallet.food < 2 {
        commands.push(PlayerCommand::BuyFood);
    }
    if view.wallet.wood < 3 {
        commands.push(PlayerCommand::Chop);
        commands.push(PlayerCommand::BuyWood);
    }
    if view.wallet.coins < 10 {
        commands.push(PlayerCommand::Work);
    }
    commands
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let events = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Vec::new(),
            IpcCommand::Frame { real_ms } => engine.advance(real_ms),
            IpcCommand::Run { seconds } => engine.run_for(seconds * 1000.0, 1000.0 / 60.0),
            IpcCommand::Command { cmd } => engine.trigger(&cmd),
        };
        for event in &events {
            log::debug!("{}: {}", event.type_name(), serde_json::to_string(event)?);
        }

        let view = engine.view();
        let reply = IpcReply { view: &view, events: &events };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(engine: &SimEngine, events: &[SimEvent], frames_shown: u64) {
    let count = |name: &str| events.iter().filter(|e| e.type_name() == name).count();
    let view = engine.view();

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  seed:            {}", engine.seed());
    println!("  frames:          {}", view.frame);
    println!("  status lines:    {frames_shown}");
    println!("  sim time:        {:.1}s", view.sim_time / 1000.0);
    println!("  fuel:            {} ({})", view.fuel_readout, view.ember_label);
    println!("  logs burning:    {}", view.log_count);
    println!("  logs added:      {}", count("log_added"));
    println!("  logs burned out: {}", count("log_burned_out"));
    println!("  logs evicted:    {}", count("log_evicted"));
    println!("  actions fired:   {}", count("action_triggered"));
    println!("  payouts:         {}", count("payout_applied"));
    println!(
        "  wallet:          wood={} coins={} food={} energy={}%",
        view.wallet.wood, view.wallet.coins, view.wallet.food, view.wallet.energy_percent
    );
    println!("  chart points:    {}", view.chart.len());
    println!("  audio:           {}", view.audio.label);
}

/// Level of everything the offline mixer produced during the run.
#[derive(Default)]
struct AudioMeter {
    peak:    f32,
    sum_sq:  f64,
    samples: u64,
}

impl AudioMeter {
    /// Mix whatever the synth has scheduled since the last drain.
    fn drain(&mut self, engine: &mut SimEngine) {
        let Some(output) = offline_output(engine) else {
            return;
        };
        if !output.is_running() {
            return;
        }
        let pending = output.now().saturating_sub(output.cursor()) as usize;
        for s in output.render(pending) {
            self.peak = self.peak.max(s.abs());
            self.sum_sq += f64::from(s * s);
            self.samples += 1;
        }
    }

    fn print(&self, engine: &mut SimEngine) {
        let Some(output) = offline_output(engine) else {
            return;
        };
        if self.samples == 0 {
            return;
        }
        let rms = (self.sum_sq / self.samples as f64).sqrt();
        println!(
            "  audio peak/rms:  {:.3} / {rms:.4} over {:.1}s ({} pops)",
            self.peak,
            self.samples as f64 / f64::from(output.sample_rate()),
            output.pops_played()
        );
    }
}

fn offline_output(engine: &mut SimEngine) -> Option<&mut OfflineOutput> {
    engine
        .crackle_mut()
        .output_mut()
        .as_any_mut()
        .downcast_mut::<OfflineOutput>()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
