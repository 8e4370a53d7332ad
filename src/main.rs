use std::io::stdout;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use libc::EXIT_FAILURE;
use nix::unistd::Uid;
use ratatui::prelude::{CrosstermBackend, Terminal};

use airsnitch::deauth;
use airsnitch::devices::WifiAdapter;
use airsnitch::eventhandler::{EventHandler, EventType};
use airsnitch::monitor;
use airsnitch::screens::App;
use airsnitch::status::{MessageLog, MessageType, StatusMessage};
use airsnitch::survey;
use airsnitch::targets;
use airsnitch::ui;

#[derive(Parser)]
#[command(
    name = "airsnitch",
    about = "Console workflow for capturing WPA handshakes with the aircrack-ng suite"
)]
struct Arguments {
    /// Preselect this interface instead of the first one discovered.
    #[arg(short, long)]
    interface: Option<String>,

    /// Run the headless survey instead of the interactive UI.
    #[arg(long)]
    survey: bool,

    /// Wall-clock budget for the survey, in seconds.
    #[arg(long, default_value_t = 60)]
    survey_time: u64,

    /// Seconds between artifact polls.
    #[arg(long, default_value_t = 1)]
    refresh: u64,

    /// Packets per deauthentication burst.
    #[arg(long, default_value_t = deauth::DEFAULT_BURST)]
    deauth_count: u32,
}

fn main() -> Result<()> {
    let args = Arguments::parse();

    // The external suite opens raw interfaces; nothing works unprivileged.
    if !Uid::effective().is_root() {
        eprintln!("airsnitch drives tools that need raw interface access; run it as root");
        exit(EXIT_FAILURE);
    }

    if args.survey {
        run_survey_mode(&args)
    } else {
        run_interactive(&args)
    }
}

fn run_survey_mode(args: &Arguments) -> Result<()> {
    let mut log = MessageLog::new(true, None);

    let adapters = monitor::discover_adapters()?;
    let mut adapter = match pick_adapter(&adapters, args.interface.as_deref()) {
        Some(adapter) => adapter,
        None => {
            println!("No wireless adapters found");
            return Ok(());
        }
    };
    log.add_message(StatusMessage::new(
        MessageType::Info,
        format!("Using adapter {}", adapter),
    ));

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let report = survey::run_survey(
        &mut adapter,
        Duration::from_secs(args.survey_time),
        Duration::from_secs(args.refresh.max(1)),
        cancel,
        &mut log,
    )?;

    log.add_message(StatusMessage::new(
        MessageType::Status,
        format!("Survey finished: {} access points seen", report.len()),
    ));
    for target in targets::viable_targets(&report) {
        log.add_message(StatusMessage::new(
            MessageType::Info,
            format!(
                "- {} [{}] stations: {} power: {}",
                target.essid,
                target.bssid,
                target.num_stations(),
                target.power_human()
            ),
        ));
    }

    if adapter.monitoring_enabled() {
        log.add_message(StatusMessage::new(
            MessageType::Status,
            format!("Restoring {} to managed mode", adapter.interface),
        ));
        if let Err(error) = monitor::stop_monitoring(&mut adapter) {
            log.add_message(StatusMessage::new(
                MessageType::Error,
                format!("{error:#}"),
            ));
        }
    }
    Ok(())
}

fn pick_adapter(adapters: &[WifiAdapter], interface: Option<&str>) -> Option<WifiAdapter> {
    match interface {
        Some(name) => adapters.iter().find(|a| a.interface == name).cloned(),
        // Prefer an adapter already in monitor mode, like the UI does.
        None => adapters
            .iter()
            .find(|a| a.monitoring_enabled())
            .or_else(|| adapters.first())
            .cloned(),
    }
}

fn run_interactive(args: &Arguments) -> Result<()> {
    let adapters = monitor::discover_adapters()?;
    let log = MessageLog::new(false, None);
    let mut app = App::new(
        adapters,
        args.interface.as_deref(),
        args.deauth_count,
        log,
    );

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;

    let mut events = EventHandler::new();
    events.start();

    let run_result = run_loop(
        &mut terminal,
        &mut app,
        &mut events,
        Duration::from_secs(args.refresh.max(1)),
    );

    events.stop();
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    restore_monitoring();

    run_result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    poll_interval: Duration,
) -> Result<()> {
    let mut last_poll: Option<Instant> = None;

    while !app.should_quit {
        match events.get() {
            Some(EventType::Key(event)) => app.handle_key(&event),
            Some(EventType::Tick) => {
                // One poll cycle finishes (fetch, parse, state update)
                // before the next one is considered.
                let due = last_poll.map_or(true, |at| at.elapsed() >= poll_interval);
                if due {
                    last_poll = Some(Instant::now());
                    app.on_tick();
                }
                terminal.draw(|frame| ui::draw(frame, app))?;
            }
            None => thread::sleep(Duration::from_millis(10)),
        }
    }
    Ok(())
}

/// Leave no interface stuck in monitor mode behind us.
fn restore_monitoring() {
    match monitor::discover_adapters() {
        Ok(adapters) => {
            for mut adapter in adapters {
                if adapter.monitoring_enabled() {
                    println!("Restoring {} to managed mode", adapter.interface);
                    if let Err(error) = monitor::stop_monitoring(&mut adapter) {
                        eprintln!("Failed to restore {}: {error:#}", adapter.interface);
                    }
                }
            }
        }
        Err(error) => eprintln!("Could not list adapters for cleanup: {error:#}"),
    }
}
