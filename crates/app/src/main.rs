use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use proctor_core::model::{SessionId, SkillLevel};
use proctor_core::{Phase, SessionConfig};
use services::{
    ApiConfig, AssessmentHistory, ControllerError, DEFAULT_REQUEST_TIMEOUT, GradingService,
    HttpAssessmentApi, InMemoryAssessmentApi, ProctoredSessionController, QuestionSource,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::render::render_history;
use ui::vm::{HistoryRowVm, map_history_rows};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingSkill,
    InvalidLevel { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingSkill => write!(f, "run requires --skill"),
            ArgsError::InvalidLevel { raw } => write!(
                f,
                "invalid --level value: {raw} (expected beginner, intermediate or advanced)"
            ),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  proctor run --skill <name> [--level <level>] [--budget <secs>]");
    eprintln!("              [--strikes <n>] [--threshold <pct>] [--onboarding]");
    eprintln!("              [--unproctored] [--offline] [--api-url <url>]");
    eprintln!("  proctor history [--id <session>] [--offline] [--api-url <url>]");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --level beginner --budget 900 --strikes 3 --threshold 60");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASCENT_API_URL, ASCENT_API_TOKEN, ASCENT_REQUEST_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// Where questions and grades come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Backend {
    offline: bool,
    api_url: Option<String>,
}

impl Backend {
    /// Consume a backend flag if `arg` is one.
    fn accept(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match arg {
            "--offline" => self.offline = true,
            "--api-url" => self.api_url = Some(require_value(args, "--api-url")?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RunArgs {
    skill: String,
    level: SkillLevel,
    config: SessionConfig,
    backend: Backend,
}

impl RunArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut skill = None;
        let mut level = SkillLevel::default();
        let mut config = SessionConfig::node_assessment();
        let mut budget = None;
        let mut strikes = None;
        let mut threshold = None;
        let mut backend = Backend::default();

        while let Some(arg) = args.next() {
            if backend.accept(&arg, args)? {
                continue;
            }
            match arg.as_str() {
                "--skill" => {
                    let value = require_value(args, "--skill")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::MissingSkill);
                    }
                    skill = Some(value.trim().to_string());
                }
                "--level" => {
                    let value = require_value(args, "--level")?;
                    level = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLevel { raw: value.clone() })?;
                }
                "--budget" => budget = Some(parse_number::<u32>(args, "--budget")?),
                "--strikes" => strikes = Some(parse_number::<u32>(args, "--strikes")?),
                "--threshold" => threshold = Some(parse_number::<f64>(args, "--threshold")?),
                "--onboarding" => config = SessionConfig::onboarding(),
                "--unproctored" => config = SessionConfig::unproctored(),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let Some(budget) = budget {
            config = config.with_time_budget(Some(budget));
        }
        if let Some(strikes) = strikes {
            config = config.with_strike_limit(Some(strikes));
        }
        if let Some(threshold) = threshold {
            config = config.with_pass_threshold(threshold);
        }

        Ok(Self {
            skill: skill.ok_or(ArgsError::MissingSkill)?,
            level,
            config,
            backend,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryArgs {
    id: Option<SessionId>,
    backend: Backend,
}

impl HistoryArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut id = None;
        let mut backend = Backend::default();

        while let Some(arg) = args.next() {
            if backend.accept(&arg, args)? {
                continue;
            }
            match arg.as_str() {
                "--id" => {
                    let value = require_value(args, "--id")?;
                    let parsed: SessionId = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--id",
                        raw: value.clone(),
                    })?;
                    id = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { id, backend })
    }
}

/// The three collaborator roles, served by one backend.
struct Collaborators {
    questions: Arc<dyn QuestionSource>,
    grading: Arc<dyn GradingService>,
    history: Arc<dyn AssessmentHistory>,
    request_timeout: Duration,
}

impl Collaborators {
    fn offline() -> Self {
        let api = InMemoryAssessmentApi::demo();
        Self {
            questions: Arc::new(api.clone()),
            grading: Arc::new(api.clone()),
            history: Arc::new(api),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    fn http(config: &ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let api = HttpAssessmentApi::new(config)?;
        Ok(Self {
            questions: Arc::new(api.clone()),
            grading: Arc::new(api.clone()),
            history: Arc::new(api),
            request_timeout: config.request_timeout,
        })
    }

    /// A controller that gives up on calls when the HTTP client would.
    fn controller(
        &self,
        config: SessionConfig,
    ) -> Result<ProctoredSessionController, ControllerError> {
        ProctoredSessionController::new(
            Arc::clone(&self.questions),
            Arc::clone(&self.grading),
            config,
        )
        .map(|controller| controller.with_request_timeout(self.request_timeout))
    }
}

fn connect(backend: &Backend) -> Result<Collaborators, Box<dyn std::error::Error>> {
    if backend.offline {
        info!("using the built-in offline question bank");
        return Ok(Collaborators::offline());
    }

    let mut config = ApiConfig::from_env()?;
    if let Some(url) = &backend.api_url {
        config.base_url.clone_from(url);
    }
    info!(
        base_url = %config.base_url,
        timeout_secs = config.request_timeout.as_secs(),
        "using assessment API"
    );
    Collaborators::http(&config)
}

async fn run_assessment(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let controller = connect(&args.backend)?.controller(args.config)?;
    let handle = controller.start(args.skill, args.level);
    let state = terminal::run_session(handle).await?;

    if state.phase() != Phase::Result {
        eprintln!("Assessment ended without a result.");
    }
    Ok(())
}

async fn show_history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let collaborators = connect(&args.backend)?;
    let rows = match args.id {
        Some(id) => vec![HistoryRowVm::from(
            &collaborators.history.session_record(id).await?,
        )],
        None => map_history_rows(&collaborators.history.history().await?),
    };
    print!("{}", render_history(&rows));
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let first = argv.next();
    let cmd = match first.as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };
    match cmd {
        Command::Run => run_assessment(RunArgs::parse(&mut argv).map_err(report)?).await,
        Command::History => show_history(HistoryArgs::parse(&mut argv).map_err(report)?).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
