use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use cuedrill::{
    app::{App, AppSettings, Flow},
    app_dirs::AppDirs,
    clock::SimulatedClock,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::TrainingSession,
    timer::ThreadTimer,
    timings::TimingSequence,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

/// Redraw at most this often while only ticks arrive.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// reflex trainer: press on cue, get judged perfect/good/ok/early/late/miss
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Plays along a list of cue timestamps and judges how close each keypress lands to its cue, then reports accuracy per cue."
)]
pub struct Cli {
    /// file with one cue timestamp (seconds) per line
    timings: PathBuf,

    /// video the timings belong to; playback itself is external
    #[clap(short = 'v', long)]
    video: Option<PathBuf>,

    /// playback length in seconds
    #[clap(short = 'd', long)]
    duration: Option<f64>,

    /// key that answers a cue (overrides config)
    #[clap(short = 'k', long)]
    key: Option<char>,

    /// do not ring the terminal bell on each cue
    #[clap(long)]
    no_sound: bool,

    /// scheduler polling interval in milliseconds (overrides config)
    #[clap(long)]
    poll_ms: Option<u64>,
}

impl Cli {
    /// Fold command-line overrides into the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(key) = self.key {
            config.cue_key = key;
        }
        if self.no_sound {
            config.sound = false;
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval_ms = ms;
        }
        config.with_usable_cue_key()
    }
}

fn init_logging(level: log::LevelFilter) {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    // stderr belongs to the TUI, so everything goes to the log file.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.apply_to(FileConfigStore::new().load());
    init_logging(config.log_level_filter());

    let timings = match TimingSequence::load(&cli.timings) {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, e.to_string()).exit();
        }
    };
    if let (Some(duration), Some(last)) = (cli.duration, timings.last()) {
        if last > duration {
            log::warn!("last cue at {last:.3}s is past the {duration:.3}s duration");
        }
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = TrainingSession::new(timings, SimulatedClock::new(cli.duration), ThreadTimer);
    let mut app = App::new(
        session,
        AppSettings {
            cue_key: config.cue_key,
            sound: config.sound,
            timings_path: cli.timings.clone(),
            video: cli.video.clone(),
        },
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let ticker = FixedTicker::from_millis(config.poll_interval_ms);
    let result = start_tui(&mut terminal, &mut app, ticker);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if let Some(report) = app.session.report() {
        println!("{}", report.render_text());
    }

    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ticker: FixedTicker,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), ticker);
    let mut last_draw = Instant::now();
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Tick => {
                if app.on_tick() {
                    ring_bell();
                }
                last_draw.elapsed() >= FRAME_INTERVAL
            }
            AppEvent::Resize => true,
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
                true
            }
        };

        if redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            last_draw = Instant::now();
        }
    }

    Ok(())
}

fn ring_bell() {
    let mut out = io::stdout();
    let _ = out.write_all(b"\x07");
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_timings() {
        assert!(Cli::try_parse_from(["cuedrill"]).is_err());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["cuedrill", "cues.txt"]);

        assert_eq!(cli.timings, PathBuf::from("cues.txt"));
        assert_eq!(cli.video, None);
        assert_eq!(cli.duration, None);
        assert_eq!(cli.key, None);
        assert!(!cli.no_sound);
        assert_eq!(cli.poll_ms, None);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::parse_from([
            "cuedrill",
            "cues.txt",
            "--video",
            "boss.mp4",
            "-d",
            "120.5",
            "-k",
            "j",
            "--no-sound",
            "--poll-ms",
            "10",
        ]);
        assert_eq!(cli.video, Some(PathBuf::from("boss.mp4")));
        assert_eq!(cli.duration, Some(120.5));
        assert_eq!(cli.key, Some('j'));
        assert!(cli.no_sound);
        assert_eq!(cli.poll_ms, Some(10));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["cuedrill", "cues.txt", "-k", "x", "--no-sound"]);
        let cfg = cli.apply_to(Config::default());
        assert_eq!(cfg.cue_key, 'x');
        assert!(!cfg.sound);
        assert_eq!(cfg.poll_interval_ms, 5);
    }

    #[test]
    fn test_cli_rejects_control_key_as_cue() {
        for key in ["s", "r", "q", " "] {
            let cli = Cli::parse_from(["cuedrill", "cues.txt", "-k", key]);
            assert_eq!(cli.apply_to(Config::default()).cue_key, 'e', "key {key:?}");
        }
    }

    #[test]
    fn test_cli_keeps_config_without_flags() {
        let cli = Cli::parse_from(["cuedrill", "cues.txt"]);
        let stored = Config {
            cue_key: 'f',
            sound: false,
            poll_interval_ms: 8,
            log_level: "debug".into(),
        };
        assert_eq!(cli.apply_to(stored.clone()), stored);
    }
}
