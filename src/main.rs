use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};

use sysmon_cli::app::{App, RefreshLoop};
use sysmon_cli::cli::{Cli, Commands, ConfigCommands, RunCommands, SortKey, VERSION_WITH_BUILD};
use sysmon_cli::core::process::sort_processes;
use sysmon_cli::core::{MetricsCollector, MetricsSource, MonitoringConfig, ProcessManager};
use sysmon_cli::screens::report::{print_report, report_lines, TextMonitor};
use sysmon_cli::utils::{init_logging, truncate_chars, uptime_since, PROCESS_NAME_WIDTH};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunCommands::Dashboard)) {
        // Config inspection must work even when the file does not validate
        Commands::Config { command } => handle_config(cli.config.as_deref(), command),
        Commands::Run(command) => {
            let (config, source) = MonitoringConfig::load_resolved(cli.config.as_deref())?;

            if let Err(e) = init_logging(&config.log_file) {
                eprintln!("{} {:#}", "Warning: file logging disabled:".yellow(), e);
            }
            log::info!("sysmon-cli {} starting", VERSION_WITH_BUILD);
            if let Some(path) = source {
                log::info!("Loaded configuration from {}", path.display());
            }

            run_command(command, config).await
        }
    }
}

async fn run_command(command: RunCommands, config: MonitoringConfig) -> Result<()> {
    match command {
        RunCommands::Report { json } => handle_report(config, json).await,
        RunCommands::Monitor => handle_monitor(config).await,
        RunCommands::Processes { sort, limit } => handle_processes(sort, limit).await,
        RunCommands::ProcessInfo { pid } => handle_process_info(pid).await,
        RunCommands::Kill { pid, force, yes } => handle_kill(pid, force, yes).await,
        RunCommands::Dashboard => handle_dashboard(config).await,
    }
}

async fn handle_report(config: MonitoringConfig, json: bool) -> Result<()> {
    let (snapshot, lines) = tokio::task::spawn_blocking(move || {
        let mut collector = MetricsCollector::new(config);
        let snapshot = collector.sample();
        let lines = report_lines(&snapshot, collector.config(), None);
        (snapshot, lines)
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_report(&snapshot, &lines);
    }

    Ok(())
}

/// Receives one message on SIGINT, for loops running on blocking threads
fn interrupt_channel() -> Receiver<()> {
    let (stop_tx, stop_rx) = mpsc::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(());
        }
    });
    stop_rx
}

async fn handle_monitor(config: MonitoringConfig) -> Result<()> {
    let interval = config.monitoring_interval();
    println!(
        "{} (every {})",
        "Starting system monitoring...".green(),
        humantime::format_duration(interval)
    );

    let stop_rx = interrupt_channel();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut monitor = TextMonitor::new(MetricsCollector::new(config));
        let mut stdout = io::stdout();

        RefreshLoop::new(interval).run(
            || {
                let (snapshot, lines) = monitor.next_report();
                execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
                print_report(&snapshot, &lines);
                Ok(())
            },
            |timeout| match stop_rx.recv_timeout(timeout) {
                Ok(()) => Ok(true),
                Err(RecvTimeoutError::Timeout) => Ok(false),
                // No signal handler; the default SIGINT behaviour still applies
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(timeout);
                    Ok(false)
                }
            },
        )
    })
    .await??;

    log::info!("Monitoring stopped by user");
    println!("\n{}", "Monitoring stopped by user".yellow());

    Ok(())
}

fn format_percent(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

async fn handle_processes(sort: Option<SortKey>, limit: Option<usize>) -> Result<()> {
    let processes = tokio::task::spawn_blocking(move || {
        let mut manager = ProcessManager::system();
        // CPU usage is a delta between two refreshes
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        let mut processes = manager.list_processes();
        if let Some(key) = sort {
            sort_processes(&mut processes, key.into());
        }
        if let Some(limit) = limit {
            processes.truncate(limit);
        }
        processes
    })
    .await?;

    println!(
        "{:<8} {:<22} {:>6} {:>6}  USER",
        "PID", "NAME", "CPU%", "MEM%"
    );
    println!("{}", "-".repeat(60));

    for p in processes {
        println!(
            "{} {:<22} {:>6} {:>6}  {}",
            format!("{:<8}", p.pid).cyan(),
            truncate_chars(&p.name, PROCESS_NAME_WIDTH),
            format_percent(p.cpu_percent),
            format_percent(p.memory_percent),
            p.username.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

async fn handle_process_info(pid: u32) -> Result<()> {
    let detail = tokio::task::spawn_blocking(move || ProcessManager::system().process_detail(pid)).await?;

    let Some(detail) = detail else {
        println!("{}", format!("Process with PID {} not found", pid).red());
        return Ok(());
    };

    println!("{}", format!("Process Details (PID: {})", detail.pid).bold());
    println!("  Name:     {}", detail.name);
    println!("  Status:   {}", detail.status);
    println!("  CPU:      {:.1}%", detail.cpu_percent);
    println!("  Memory:   {:.1}%", detail.memory_percent);
    println!("  User:     {}", detail.username.as_deref().unwrap_or("-"));

    match detail.create_time {
        Some(started) => {
            println!("  Started:  {}", started.format("%Y-%m-%d %H:%M:%S"));
            println!("  Uptime:   {}", uptime_since(started, Local::now()));
        }
        None => println!("  Started:  -"),
    }

    if detail.cmdline.is_empty() {
        println!("  Command:  -");
    } else {
        println!("  Command:  {}", detail.cmdline.join(" "));
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn handle_kill(pid: u32, force: bool, yes: bool) -> Result<()> {
    if !force && !yes && !confirm(&format!("Really kill process {}?", pid))? {
        bail!("Aborted");
    }

    let killed = tokio::task::spawn_blocking(move || ProcessManager::system().kill_process(pid, force)).await?;

    if killed {
        println!("{}", format!("Process {} terminated successfully", pid).green());
    } else {
        println!("{}", format!("Failed to terminate process {}", pid).red());
    }

    Ok(())
}

async fn handle_dashboard(config: MonitoringConfig) -> Result<()> {
    let stop = interrupt_channel();
    tokio::task::spawn_blocking(move || App::new(config).run(stop)).await??;

    println!("{}", "Dashboard closed".yellow());
    Ok(())
}

fn handle_config(explicit: Option<&Path>, command: ConfigCommands) -> Result<()> {
    let path = MonitoringConfig::resolve_path(explicit)?;

    match command {
        ConfigCommands::Path => match path {
            Some(path) => println!("{}", path.display()),
            None => {
                println!("No configuration file found, using defaults");
                if let Some(user) = MonitoringConfig::user_config_path() {
                    println!("Looked in ./config.yaml and {}", user.display());
                }
            }
        },
        ConfigCommands::View => {
            let config = match &path {
                Some(path) => MonitoringConfig::read(path)?,
                None => MonitoringConfig::default(),
            };

            match &path {
                Some(path) => println!("Configuration ({}):\n", path.display()),
                None => println!("Configuration (defaults):\n"),
            }
            println!("  cpu_threshold:          {}%", config.cpu_threshold);
            println!("  memory_threshold:       {}%", config.memory_threshold);
            println!("  disk_threshold:         {}%", config.disk_threshold);
            println!("  network_threshold:      {} bytes/s", config.network_threshold);
            println!(
                "  monitoring_interval:    {}",
                humantime::format_duration(config.monitoring_interval())
            );
            println!(
                "  dashboard_refresh_rate: {}",
                humantime::format_duration(config.dashboard_refresh())
            );
            println!("  log_file:               {}", config.log_file.display());
            println!(
                "  alert_email:            {}",
                config.alert_email.as_deref().unwrap_or("-")
            );
        }
        ConfigCommands::Validate => {
            let config = match &path {
                Some(path) => MonitoringConfig::read(path)?,
                None => MonitoringConfig::default(),
            };
            let errors = config.validate();

            if errors.is_empty() {
                println!("{}", "✓ Configuration is valid".green());
            } else {
                println!("{}", "✗ Configuration errors:".red());
                for error in errors {
                    println!("  - {}", error);
                }
            }
        }
    }

    Ok(())
}
