use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    thread,
    time::Duration,
};

use robopiano::allocator::VoiceAllocator;
use robopiano::bus::{BusReader, BusWire, BusWriter, PacketAssembler, READY_BYTE};
use robopiano::config::{Mode, RigConfig};
use robopiano::hw::{PulseProbe, SystemTimer, Timer};
use robopiano::midi::{DecodeMode, EventAssembler, MidiPort, SerialBitDecoder, SerialWire};
use robopiano::ring;
use robopiano::sched::{MotorSnapshot, StepScheduler};
use robopiano::ui::{app::MonitorApp, events, render};
use robopiano::units;

/// Player-piano rig: MIDI in, stepper pulses out
#[derive(Parser, Debug)]
#[command(name = "robopiano")]
#[command(about = "Drives a motor bus from live or recorded MIDI", long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config", required_unless_present = "list_devices")]
    config: Option<std::path::PathBuf>,

    /// List available MIDI input devices and exit
    #[arg(short = 'l', long = "list")]
    list_devices: bool,

    /// Run without the terminal monitor
    #[arg(long = "headless")]
    headless: bool,

    /// Stop after this many seconds (headless only)
    #[arg(long = "duration")]
    duration: Option<u64>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Handle --list flag
    if args.list_devices {
        let devices = MidiPort::list_devices()?;
        println!("Available MIDI Input Devices:");
        for (i, device) in devices.iter().enumerate() {
            println!("  {}: {}", i, device);
        }
        return Ok(());
    }

    // Config is required when not listing (enforced by clap)
    let config_path = args.config.expect("--config is required");
    let config = RigConfig::load(&config_path)?;

    run_rig(config, args.headless, args.duration)
}

/// Bring the whole rig up in one process: input feed, controller loop,
/// motor unit loop, and (unless headless) the bus monitor.
fn run_rig(config: RigConfig, headless: bool, duration: Option<u64>) -> Result<()> {
    let timer: Arc<dyn Timer> = Arc::new(SystemTimer::new());
    let stop = Arc::new(AtomicBool::new(false));
    let wire = BusWire::new();

    // Every listener must be on the bus before the controller's hello
    let motor_reader = BusReader::attach(&wire, 256);
    let monitor_reader = (!headless).then(|| BusReader::attach(&wire, 256));

    // Serial byte queue between the input feed and the controller
    let (serial_tx, serial_rx) = ring::ring(512);

    let mut feeder: Option<thread::JoinHandle<()>> = None;

    // Live input holds the port open through this guard; sequenced input
    // clocks a recorded stream onto a modelled serial line instead
    let _input: Option<MidiPort> = match config.mode {
        Mode::Live => Some(MidiPort::connect(config.input.port.as_deref(), serial_tx)?),
        Mode::Sequenced => {
            let stream_path = config
                .input
                .stream
                .clone()
                .context("sequenced mode needs input.stream")?;
            let score = std::fs::read(&stream_path)
                .with_context(|| format!("read stream {}", stream_path.display()))?;

            let serial = SerialWire::new(Arc::clone(&timer), config.serial.baud);
            let mut decoder = SerialBitDecoder::new(
                serial.clone(),
                Arc::clone(&timer),
                config.serial.baud,
                serial_tx,
            );
            serial.on_falling(move || decoder.on_falling_edge());

            let pace = Duration::from_millis(config.input.pace_ms);
            let stop_feed = Arc::clone(&stop);
            feeder = Some(thread::spawn(move || {
                for message in score.chunks(3) {
                    if stop_feed.load(Ordering::Relaxed) {
                        return;
                    }
                    for &byte in message {
                        serial.send_byte(byte);
                    }
                    thread::sleep(pace);
                }
            }));
            None
        }
    };

    // Controller: serial bytes in, note packets out
    let assembler = match config.mode {
        Mode::Live => EventAssembler::new(DecodeMode::Live),
        Mode::Sequenced => EventAssembler::new(DecodeMode::Sequenced),
    };
    let allocator = match config.mode {
        Mode::Live => VoiceAllocator::live(config.motors, config.keyboard.key_offset),
        Mode::Sequenced => VoiceAllocator::sequenced(
            config.motors,
            config.keyboard.key_offset,
            config.channel_map(),
        ),
    };
    let writer = BusWriter::new(wire.clone(), Arc::clone(&timer), config.bus.hold_us);
    let controller = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            units::controller::run(serial_rx, assembler, allocator, writer, stop, headless)
        })
    };

    // Motor unit: note packets in, step pulses out
    let probes: Vec<PulseProbe> = (0..config.motors).map(|_| PulseProbe::new()).collect();
    let scheduler = StepScheduler::new(probes, config.step_table(), Arc::clone(&timer));
    let (snap_tx, snap_rx) = crossbeam_channel::bounded(8);
    let motors = {
        let stop = Arc::clone(&stop);
        let timer = Arc::clone(&timer);
        thread::spawn(move || units::motors::run(motor_reader, scheduler, timer, snap_tx, stop, headless))
    };

    if let Some(reader) = monitor_reader {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut app = MonitorApp::new(config.motors, config.keyboard.keys as u8);

        // Run UI loop
        run_monitor_loop(&mut terminal, &mut app, reader, snap_rx)?;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
    } else if let Some(secs) = duration {
        thread::sleep(Duration::from_secs(secs));
    } else {
        println!("running headless; ctrl-c to stop");
        loop {
            thread::sleep(Duration::from_secs(3600));
        }
    }

    stop.store(true, Ordering::Relaxed);
    let _ = controller.join();
    let _ = motors.join();
    if let Some(handle) = feeder {
        let _ = handle.join();
    }

    Ok(())
}

/// Pump the bus tap and motor snapshots into the monitor until quit
fn run_monitor_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut MonitorApp,
    mut reader: BusReader,
    snapshots: crossbeam_channel::Receiver<Vec<MotorSnapshot>>,
) -> Result<()> {
    let mut framer = PacketAssembler::new();
    loop {
        // Drain the bus tap
        while let Some(byte) = reader.read_byte() {
            if !app.ready && byte == READY_BYTE {
                // The hello precedes any packet, so this cannot split a frame
                app.observe_ready();
                continue;
            }
            if let Some(packet) = framer.push(byte) {
                app.apply_packet(packet);
            }
        }

        // Latest motor unit state wins over overheard packets
        while let Ok(snaps) = snapshots.try_recv() {
            app.update_snapshots(&snaps);
        }
        app.tick();

        // Render UI
        terminal.draw(|f| render::render(f, app))?;

        // Handle events
        events::handle_events(app)?;

        // Check if should quit
        if app.should_quit {
            break;
        }

        // Small sleep to reduce CPU usage
        std::thread::sleep(Duration::from_millis(16)); // ~60 FPS
    }

    Ok(())
}
