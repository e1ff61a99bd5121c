//! rewild - AI-assisted depaving and site restoration
//!
//! CLI entry point for the wizard and the batch commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use rewild::ai::{RetryPolicy, create_client};
use rewild::cli::{Cli, Command, LocationArgs, OutputFormat, generate_after_help};
use rewild::config::{AiConfig, Config};
use rewild::domain::{
    BudgetTier, LocalSearchResult, RestorationPlan, RestorationType, SiteAnalysis, SiteImage,
};
use rewild::export::export_project;
use rewild::geo::create_locator;
use rewild::prompts::{PromptLoader, RequestBuilder};
use rewild::session::{Controller, FlowError, FlowState, Studio};
use rewild::tui::{self, PendingAction, RunnerPaths};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can trace
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rewild")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("rewild.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help(&AiConfig::default().api_key_env));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.ai.provider, "rewild loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Tui { image, demo, location }) => cmd_tui(&config, image, demo, &location).await,
        Some(Command::Analyze { image, format, location }) => cmd_analyze(&config, &image, format, &location).await,
        Some(Command::Plan {
            image,
            restoration_type,
            budget,
            services,
            out,
            format,
            location,
        }) => {
            let out = out.unwrap_or_else(|| config.paths.output_dir.clone());
            cmd_plan(&config, &image, restoration_type, budget, services, &out, format, &location).await
        }
        Some(Command::Types) => cmd_types(),
        None => {
            debug!("main: no command specified, launching TUI");
            cmd_tui(&config, None, false, &LocationArgs::default()).await
        }
    }
}

/// Wire the AI client, prompts and retry policy together
fn build_studio(config: &Config) -> Result<Arc<Studio>> {
    debug!("build_studio: called");
    config.validate()?;
    let client = create_client(&config.ai).context("Failed to create AI client")?;
    let loader = PromptLoader::new(config.paths.prompts_dir.as_deref());
    let builder = RequestBuilder::new(loader, config.ai.models.clone());
    let policy = RetryPolicy::from_config(&config.retry);
    let studio = Studio::new(client, builder, policy).with_max_providers(config.ai.max_providers);
    Ok(Arc::new(studio))
}

/// Launch the interactive wizard
async fn cmd_tui(config: &Config, image: Option<PathBuf>, demo: bool, location: &LocationArgs) -> Result<()> {
    debug!(?image, demo, "cmd_tui: called");
    let studio = build_studio(config)?;
    let cli_location = location.location()?;
    let locator = Arc::from(create_locator(&config.location, cli_location));

    let mut initial = Vec::new();
    if cli_location.is_some() {
        initial.push(PendingAction::RequestLocation);
    }
    if let Some(path) = image {
        initial.push(PendingAction::OpenImage(path));
    } else if demo {
        initial.push(PendingAction::DemoImage);
    }

    let paths = RunnerPaths {
        output_dir: config.paths.output_dir.clone(),
        demo_image_url: config.paths.demo_image_url.clone(),
    };
    tui::run(studio, locator, paths, initial).await
}

/// Upload and analyse, returning a controller parked in ReviewAnalysis
async fn analyzed(config: &Config, image: &Path, location: &LocationArgs) -> Result<Controller> {
    debug!(?image, "analyzed: called");
    let studio = build_studio(config)?;
    let image = SiteImage::from_path(image)?;
    let mut controller = Controller::new(studio, create_locator(&config.location, location.location()?));

    controller.request_location().await;
    if let Some(loc) = controller.session().location() {
        eprintln!("{} {}", "Location:".dimmed(), loc);
    } else if let Some(notice) = controller.session().notice() {
        eprintln!("{} {}", "Location:".dimmed(), notice.message.yellow());
    }

    eprintln!("{}", "Analyzing site...".dimmed());
    if controller.upload(image).await? != FlowState::ReviewAnalysis {
        return Err(failure(&controller, "Site analysis failed"));
    }
    Ok(controller)
}

/// Print a site analysis
async fn cmd_analyze(config: &Config, image: &Path, format: OutputFormat, location: &LocationArgs) -> Result<()> {
    debug!(?image, %format, "cmd_analyze: called");
    let controller = analyzed(config, image, location).await?;
    let analysis = controller
        .session()
        .project()
        .analysis
        .as_ref()
        .ok_or(FlowError::NoAnalysis)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(analysis)?),
        OutputFormat::Text => print_analysis(analysis),
    }
    Ok(())
}

/// Analyse, generate, optionally look up services, and save
#[allow(clippy::too_many_arguments)]
async fn cmd_plan(
    config: &Config,
    image: &Path,
    restoration_type: RestorationType,
    budget: BudgetTier,
    services: bool,
    out: &Path,
    format: OutputFormat,
    location: &LocationArgs,
) -> Result<()> {
    debug!(?image, %restoration_type, %budget, services, ?out, "cmd_plan: called");
    let mut controller = analyzed(config, image, location).await?;

    eprintln!("{}", format!("Generating {} vision and {} plan...", restoration_type, budget).dimmed());
    if controller.choose(restoration_type, budget).await? != FlowState::Complete {
        return Err(failure(&controller, "Generating the plan failed"));
    }

    let mut found = Vec::new();
    if services {
        let count = controller.session().project().plan.as_ref().map_or(0, |p| p.phases.len());
        for phase_index in 0..count {
            match controller.local_services(phase_index).await {
                Ok(result) => found.push(result),
                Err(FlowError::LocationRequired) => {
                    eprintln!("{}", "Skipping local services: no location (use --lat/--lon)".yellow());
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    let project = controller.session().project();
    let dir = export_project(project, out)?;
    let plan = project.plan.as_ref().ok_or(FlowError::NoPlan)?;

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "analysis": project.analysis,
                "restorationType": restoration_type.code(),
                "budget": budget,
                "plan": plan,
                "services": found,
                "savedTo": dir,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print_plan(plan);
            for result in &found {
                print_services(plan, result);
            }
            println!();
            println!("{} {}", "Saved to".green(), dir.display());
        }
    }
    Ok(())
}

/// List the restoration types and budget tiers
fn cmd_types() -> Result<()> {
    debug!("cmd_types: called");
    println!("{}", "Restoration types:".bold());
    for t in RestorationType::ALL {
        println!("  {:<18} {}", t.slug().cyan(), t.description());
    }
    println!();
    println!("{}", "Budget tiers:".bold());
    for b in BudgetTier::ALL {
        println!("  {:<18} {}", b.slug().cyan(), b.guidance());
    }
    Ok(())
}

/// Turn the session's notice into an error
fn failure(controller: &Controller, fallback: &str) -> eyre::Report {
    match controller.session().notice() {
        Some(notice) => eyre::eyre!("{}", notice.message),
        None => eyre::eyre!("{}", fallback),
    }
}

fn print_analysis(analysis: &SiteAnalysis) {
    println!("{}", "Site analysis".bold().green());
    println!("{}", analysis.summary);
    println!();
    println!("  {:<16} {}", "Sunlight".dimmed(), analysis.sunlight.label());
    println!("  {:<16} {}%", "Sealed ground".dimmed(), analysis.soil_sealing_percent);
    println!("  {:<16} {}/100", "Biodiversity".dimmed(), analysis.biodiversity_score);
    println!("  {:<16} {}", "Hardiness zone".dimmed(), analysis.hardiness_zone);
    println!("  {:<16} ~{:.0} m²", "Area".dimmed(), analysis.estimated_area_sqm);
    print_list("Features", &analysis.features);
    print_list("Deficits", &analysis.deficits);

    println!();
    println!("{}", "Suitability".bold());
    for s in analysis.ranked() {
        let score = format!("{:>3}", s.score);
        let score = match s.score {
            70.. => score.green(),
            40..=69 => score.yellow(),
            _ => score.red(),
        };
        println!("  {} {:<18} {}", score, s.restoration_type.slug().cyan(), s.rationale.dimmed());
    }
}

fn print_plan(plan: &RestorationPlan) {
    println!();
    println!("{}", plan.title.bold().green());
    println!("{}", plan.summary);
    println!(
        "{} {}   {} {}",
        "Duration".dimmed(),
        plan.total_duration,
        "Cost".dimmed(),
        plan.money(plan.total_cost)
    );
    for (i, phase) in plan.phases.iter().enumerate() {
        println!();
        println!(
            "{} {}  {}",
            format!("{}.", i + 1).cyan(),
            phase.name.bold(),
            format!("{} · {}", phase.duration, plan.money(phase.cost)).dimmed()
        );
        for task in &phase.tasks {
            println!("   • {}", task);
        }
        if !phase.materials.is_empty() {
            println!("   {} {}", "Materials:".dimmed(), phase.materials.join(", "));
        }
        println!("   {} {}", "Hire:".dimmed(), phase.service_category);
    }
    print_list("Maintenance", &plan.maintenance);
    print_list("Impact", &plan.impact);
}

fn print_services(plan: &RestorationPlan, result: &LocalSearchResult) {
    let phase = plan.phase(result.phase_index).map_or("?", |p| p.name.as_str());
    println!();
    println!("{} {} ({})", "Local services for".bold(), phase.bold(), result.category);
    if result.is_empty() {
        println!("   {}", "No local providers found".yellow());
        return;
    }
    for p in &result.providers {
        println!("   {} {}", "◆".green(), p.name.bold());
        for extra in [&p.description, &p.phone, &p.address] {
            if !extra.is_empty() {
                println!("     {}", extra);
            }
        }
    }
    for source in &result.sources {
        println!("   {}", source.dimmed());
    }
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", heading.bold());
    for item in items {
        println!("  • {}", item);
    }
}
