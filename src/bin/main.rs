use clap::Parser;
use fishes::{
    logging, BrowserKind, Config, FishCount, FishSpeed, Runner, Speed, Step, StepOutcome,
    StepStatus, Targets,
};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser)]
#[command(name = "fishes")]
#[command(
    about = "Spawns an aquarium from https://webglsamples.org/aquarium/aquarium.html in the browser"
)]
#[command(version)]
struct Cli {
    /// Browser used to load the website (options: Chrome, Firefox)
    #[arg(value_parser = parse_browser)]
    browser: BrowserKind,

    /// Number of fishes to spawn (options: 1, 100, 500, 1000, 5000, 10000, 15000, 20000, 25000, 30000)
    #[arg(short, long, value_name = "N", default_value = "500", value_parser = parse_fishes)]
    fishes: FishCount,

    /// Overall speed of the aquarium (options: 0, 1, 2, 3, 4)
    #[arg(short, long, value_name = "N", default_value = "2", value_parser = parse_speed)]
    speed: Speed,

    /// Speed of the fish (options: 0, 1, 2)
    #[arg(
        long = "fishspeed",
        visible_alias = "fs",
        value_name = "N",
        default_value = "1",
        value_parser = parse_fish_speed
    )]
    fish_speed: FishSpeed,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,

    /// Config file overriding page layout and slider tuning
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Close the browser once configured instead of waiting for Ctrl-C
    #[arg(long)]
    exit: bool,

    /// Validate config and arguments without running
    #[arg(long)]
    check: bool,

    /// Where errors are logged
    #[arg(long, value_name = "FILE", default_value = logging::DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

fn parse_browser(s: &str) -> Result<BrowserKind, String> {
    s.parse().map_err(|e: fishes::Error| e.to_string())
}

fn parse_fishes(s: &str) -> Result<FishCount, String> {
    let n: u32 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    FishCount::new(n).map_err(|e| e.to_string())
}

fn parse_speed(s: &str) -> Result<Speed, String> {
    let n: u8 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    Speed::new(n).map_err(|e| e.to_string())
}

fn parse_fish_speed(s: &str) -> Result<FishSpeed, String> {
    let n: u8 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    FishSpeed::new(n).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> fishes::Result<()> {
    let cli = Cli::parse();

    logging::init(logging::level(cli.verbose, cli.quiet), &cli.log_file);
    let verbose = cli.verbose > 0 && !cli.quiet;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.headless {
        config.browser.headless = true;
    }

    let targets = Targets {
        fishes: cli.fishes,
        speed: cli.speed,
        fish_speed: cli.fish_speed,
    };

    if cli.check {
        print_check(&cli, &config, &targets);
        return Ok(());
    }

    let runner = match Runner::launch(cli.browser, config).await {
        Ok(runner) => runner,
        Err(e) => {
            println!(
                "There was an error creating the browser instance. Check {} for details",
                cli.log_file.display()
            );
            error!("browser launch failed: {}", e);
            eprintln!("Program aborted due to errors");
            std::process::exit(1);
        }
    };

    if verbose {
        println!("Currently running on: {}", std::env::consts::OS);
        println!("{} browser loaded.", cli.browser);
    }

    if let Err(e) = runner.navigate().await {
        println!(
            "There was an error loading the webpage. Check {} for details",
            cli.log_file.display()
        );
        error!("navigation failed: {}", e);
        let _ = runner.close().await;
        eprintln!("Program aborted due to errors");
        std::process::exit(1);
    }
    if verbose {
        println!("Webpage loaded.");
    }

    let report = runner
        .configure_with(&targets, |outcome| {
            print_step(outcome, &targets, verbose, &cli.log_file)
        })
        .await;
    if verbose {
        println!("Duration: {}ms", report.duration_ms);
    }

    if !cli.exit {
        println!("Aquarium running. Press Ctrl-C to close the browser.");
        tokio::signal::ctrl_c().await?;
    }
    runner.close().await?;

    if !report.success() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_step(outcome: &StepOutcome, targets: &Targets, verbose: bool, log_file: &Path) {
    if let Some(failure) = outcome.failure() {
        println!(
            "There was an error {}. Check {} for details",
            failure,
            log_file.display()
        );
        return;
    }
    if !verbose {
        return;
    }
    match (&outcome.status, outcome.step) {
        (StepStatus::Skipped, step) => {
            println!("Skipped {}: advanced settings unavailable.", step)
        }
        (_, Step::FishCount) => println!("Successfully spawned {} fish.", targets.fishes),
        (_, Step::AdvancedSettings) => println!("Advanced settings opened."),
        (_, Step::Speed) => println!("Successfully set speed to {}.", targets.speed),
        (_, Step::FishSpeed) => {
            println!("Successfully set fish speed to {}.", targets.fish_speed)
        }
    }
}

fn print_check(cli: &Cli, config: &Config, targets: &Targets) {
    println!("Config valid");
    println!("  Browser: {} ({})", cli.browser, cli.browser.protocol());
    if cli.browser == BrowserKind::Firefox {
        match &config.browser.webdriver_url {
            Some(url) => println!("  WebDriver: {}", url),
            None => println!(
                "  WebDriver: spawn {}",
                config.browser.geckodriver.as_deref().unwrap_or("geckodriver")
            ),
        }
    }
    println!("  Target: {}", config.target.url);
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Fishes: {} (#{}{})",
        targets.fishes,
        config.page.fish_option_prefix,
        targets.fishes.option_index()
    );
    println!("  Speed: {}", targets.speed);
    println!("  Fish speed: {}", targets.fish_speed);
    println!(
        "  Slider: tolerance {}, gain {}px/unit, max {} drags",
        config.slider.tolerance, config.slider.gain, config.slider.max_iterations
    );
}
