use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use quiz_app::driver::{SAVE_DRAIN_TIMEOUT, drain_saves, run_quiz};
use quiz_app::logging::{LogConfig, init_logging};
use quiz_app::presenter::TerminalPresenter;
use quiz_services::bank::{load_bank, sample_bank};
use quiz_services::{
    ApiConfig, Clock, ConfigError, HttpScoreApi, InMemoryScoreApi, QuizService, ScoreApi,
    check_base_url,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { origin: &'static str, raw: String },
    InvalidApiUrl { raw: String },
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { origin, raw } => write!(f, "invalid {origin} value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
            ArgsError::Config(err) => write!(f, "{err}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [--api <url>] [--questions <path>] [--seed <n>] [--offline] [-v|-vv]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api http://localhost:5000/api");
    eprintln!("  --questions <bundled sample bank>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_URL, QUIZ_API_TIMEOUT_SECS, QUIZ_QUESTIONS, QUIZ_SEED, RUST_LOG");
}

struct Args {
    api: ApiConfig,
    questions: Option<PathBuf>,
    seed: Option<u64>,
    offline: bool,
    verbosity: u8,
}

impl Args {
    /// Flags override the environment; both are validated the same way.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut api = ApiConfig::from_lookup(&env).map_err(ArgsError::Config)?;
        let mut questions = env("QUIZ_QUESTIONS")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let mut seed = env("QUIZ_SEED")
            .filter(|v| !v.trim().is_empty())
            .map(|value| parse_seed("QUIZ_SEED", value))
            .transpose()?;
        let mut offline = false;
        let mut verbosity = 0_u8;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    let url = check_base_url(value).map_err(|err| match err {
                        ConfigError::InvalidBaseUrl(raw) => ArgsError::InvalidApiUrl { raw },
                        other => ArgsError::Config(other),
                    })?;
                    api = api.with_base_url(url);
                }
                "--questions" => {
                    questions = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--seed" => {
                    seed = Some(parse_seed("--seed", require_value(args, "--seed")?)?);
                }
                "--offline" => offline = true,
                "-v" => verbosity = verbosity.saturating_add(1),
                "-vv" => verbosity = verbosity.saturating_add(2),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api,
            questions,
            seed,
            offline,
            verbosity,
        })
    }
}

fn parse_seed(origin: &'static str, value: String) -> Result<u64, ArgsError> {
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { origin, raw: value })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging(&LogConfig::from_verbosity(args.verbosity));

    let bank = match &args.questions {
        Some(path) => load_bank(path)?,
        None => sample_bank()?,
    };

    let api: Arc<dyn ScoreApi> = if args.offline {
        info!("offline mode: scores stay in memory");
        Arc::new(InMemoryScoreApi::new())
    } else {
        info!(base_url = %args.api.base_url, "using score service");
        Arc::new(HttpScoreApi::new(args.api)?)
    };

    let service = QuizService::new(Clock::default_clock(), api, bank).with_seed(args.seed);
    let mut quiz = service.new_quiz()?;

    let stdin = io::stdin();
    let mut presenter = TerminalPresenter::new(stdin.lock(), io::stdout());
    let pending = run_quiz(&service, &mut quiz, &mut presenter).await?;

    drain_saves(pending, SAVE_DRAIN_TIMEOUT).await;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
