use clap::{Arg, ArgAction, ArgMatches, Command};
use panelmon_core::{
    config::CliConfig, default_sensors, ChannelAdapter, Config, MetricKind, Sampler, Theme,
};
use panelmon_tui::{IndicatorView, LineFormat, LinePrinter};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, stdout},
    path::{Path, PathBuf},
    process,
    sync::Mutex,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PANELMON_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let line_format = if matches.get_flag("json") {
        Some(LineFormat::Json)
    } else if matches.get_flag("plain") || matches.get_flag("once") {
        Some(LineFormat::Plain)
    } else {
        None
    };

    init_logging(
        matches.get_one::<PathBuf>("log-file").map(PathBuf::as_path),
        line_format.is_some(),
    )?;

    let cli_config = cli_config(&matches);
    let config_path = matches.get_one::<PathBuf>("config");
    let config = Config::load(Some(&cli_config), config_path.map(PathBuf::as_path))?;
    debug!(?config, "configuration loaded");

    let ascii = matches.get_flag("ascii") || config.no_color;
    match line_format {
        Some(format) if matches.get_flag("once") => run_once(config, format, ascii),
        Some(format) => run_lines(config, format, ascii),
        None => run_tui(config, ascii),
    }
}

fn cli() -> Command {
    Command::new("panelmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Status-bar system monitor: CPU, GPU, memory, disk and network at a glance")
        .arg(
            Arg::new("interval")
                .long("interval")
                .short('i')
                .value_name("SECS")
                .help("Update interval in seconds (1, 2 or 5)")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("disable")
                .long("disable")
                .value_name("METRIC")
                .help("Metric to switch off: cpu, gpu, memory, disk, net_down, net_up")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(|s: &str| s.parse::<MetricKind>()),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .value_name("THEME")
                .help("UI theme")
                .value_parser(["dark", "light"]),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colors and emoji")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-elevate")
                .long("no-elevate")
                .help("Never ask for elevated privileges for the GPU utility")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to JSON configuration file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Print the panel label once per interval instead of drawing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON object per interval instead of drawing")
                .action(ArgAction::SetTrue)
                .conflicts_with("plain"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Take a single sample, print it and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ascii")
                .long("ascii")
                .help("Use text tags instead of emoji symbols")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write logs to this file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn cli_config(matches: &ArgMatches) -> CliConfig {
    CliConfig {
        interval_secs: matches.get_one::<u32>("interval").copied(),
        disabled: matches
            .get_many::<MetricKind>("disable")
            .map(|kinds| kinds.copied().collect())
            .unwrap_or_default(),
        theme: matches.get_one::<String>("theme").map(|t| match t.as_str() {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }),
        no_color: matches.get_flag("no-color"),
        no_elevate: matches.get_flag("no-elevate"),
    }
}

/// Line modes log to stderr; the terminal indicator owns the screen, so it
/// logs to a file.
fn init_logging(log_file: Option<&Path>, line_mode: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_names(true)
        .with_env_filter(filter);

    let path = match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if line_mode => None,
        None => dirs::cache_dir().map(|dir| dir.join("panelmon").join("panelmon.log")),
    };

    match path {
        Some(path) => {
            let file = open_log_file(&path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

fn run_once(config: Config, format: LineFormat, ascii: bool) -> anyhow::Result<()> {
    let (adapter, _snapshots) = ChannelAdapter::new(1);
    let mut sampler = Sampler::new(default_sensors(&config), Box::new(adapter));
    sampler.reconfigure(config)?;

    let snapshot = sampler.sample_now()?;
    let mut printer = LinePrinter::new(stdout(), format, IndicatorView::new(ascii));
    printer.print(&snapshot)?;
    Ok(())
}

fn run_lines(config: Config, format: LineFormat, ascii: bool) -> anyhow::Result<()> {
    let (adapter, snapshots) = ChannelAdapter::new(1);
    let mut sampler = Sampler::new(default_sensors(&config), Box::new(adapter));
    sampler.start(config)?;

    let mut printer = LinePrinter::new(stdout(), format, IndicatorView::new(ascii));
    for snapshot in snapshots.iter() {
        if let Err(e) = printer.print(&snapshot) {
            sampler.stop();
            // the bar reading our output went away
            if e.kind() == io::ErrorKind::BrokenPipe {
                info!("output closed");
                return Ok(());
            }
            return Err(e.into());
        }
    }

    sampler.stop();
    Ok(())
}

fn run_tui(config: Config, ascii: bool) -> anyhow::Result<()> {
    let sensors = default_sensors(&config);
    let mut app = panelmon_tui::App::new(config, sensors, ascii)?;
    let mut stdout = stdout();
    app.run(&mut stdout)?;
    Ok(())
}
