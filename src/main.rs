use ai_it::cmd;
use ai_it::config::{AppConfig, ConfigManager};
use ai_it::error;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "ai-it",
    about = "AI assistant for Microsoft 365 IT: Intune, Entra ID, Graph",
    version,
    long_about = "AI assistant for Microsoft 365 IT operations\n\n\
                  Pulls Intune and directory data from Microsoft Graph with app-only credentials\n\
                  and turns it into reports, remediation suggestions and documentation\n\
                  using OpenAI or Azure OpenAI."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Microsoft Graph listings: users, Intune devices, groups
    #[command(subcommand)]
    Graph(GraphCommands),

    /// Probe Graph endpoints and report permission status
    CheckPermissions(cmd::permissions::CheckPermissionsArgs),

    /// Generate documentation from an Intune snapshot
    DocIntune(cmd::doc_intune::DocIntuneArgs),

    /// Remediation suggestions from Intune devices, apps and configurations
    SuggestFixes(cmd::suggest_fixes::SuggestFixesArgs),

    /// Top trends and an executive summary from Intune data
    TrendSummary(cmd::trend_summary::TrendSummaryArgs),

    /// IT assistant for Azure, Entra ID, Intune, Windows and PowerShell
    Copilot(cmd::copilot::CopilotArgs),

    /// Look up a user and their managed devices, then summarize
    AnalyzeUser(cmd::analyze::AnalyzeUserArgs),

    /// Summarize a single Intune managed device
    AnalyzeDevice(cmd::analyze::AnalyzeDeviceArgs),

    /// Audit summary across devices, apps and configurations
    AuditIntune(cmd::analyze::TopArgs),

    /// List Intune mobile apps with a coverage summary
    ListApps(cmd::analyze::TopArgs),

    /// List Intune device configurations with a coverage summary
    ListConfigs(cmd::analyze::TopArgs),

    /// Generate documentation for a script or configuration file
    Doc(cmd::documentation::FileArgs),

    /// Analyze a log file
    Log(cmd::documentation::FileArgs),

    /// Pre-scan a log tail for errors and known failure patterns, then grade its severity
    AnalyzeLog(cmd::analyze_log::AnalyzeLogArgs),
}

#[derive(Subcommand, Debug)]
enum GraphCommands {
    /// List users
    Users(cmd::graph::ListArgs),
    /// List Intune managed devices
    Devices(cmd::graph::ListArgs),
    /// List groups
    Groups(cmd::graph::ListArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, config: &AppConfig) {
    let level = if verbose {
        "debug"
    } else if config.log_level.is_empty() {
        "warn"
    } else {
        config.log_level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("ai_it={}", level))
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> error::Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new()?.load_app_config(Path::new(".env"))?;
    init_tracing(cli.verbose, &config);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Graph(graph_cmd) => match graph_cmd {
            GraphCommands::Users(args) => cmd::graph::users(&config, args).await?,
            GraphCommands::Devices(args) => cmd::graph::devices(&config, args).await?,
            GraphCommands::Groups(args) => cmd::graph::groups(&config, args).await?,
        },
        Commands::CheckPermissions(args) => cmd::permissions::run(&config, args).await?,
        Commands::DocIntune(args) => cmd::doc_intune::run(&config, args).await?,
        Commands::SuggestFixes(args) => cmd::suggest_fixes::run(&config, args).await?,
        Commands::TrendSummary(args) => cmd::trend_summary::run(&config, args).await?,
        Commands::Copilot(args) => cmd::copilot::run(&config, args).await?,
        Commands::AnalyzeUser(args) => cmd::analyze::analyze_user(&config, args).await?,
        Commands::AnalyzeDevice(args) => cmd::analyze::analyze_device(&config, args).await?,
        Commands::AuditIntune(args) => cmd::analyze::audit_intune(&config, args).await?,
        Commands::ListApps(args) => cmd::analyze::list_apps(&config, args).await?,
        Commands::ListConfigs(args) => cmd::analyze::list_configs(&config, args).await?,
        Commands::Doc(args) => cmd::documentation::doc(&config, args).await?,
        Commands::Log(args) => cmd::documentation::log(&config, args).await?,
        Commands::AnalyzeLog(args) => cmd::analyze_log::run(&config, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_doc_intune_defaults() {
        let cli = Cli::parse_from(["ai-it", "doc-intune", "--type", "compliance-gap"]);
        match cli.command {
            Commands::DocIntune(args) => {
                assert_eq!(args.report_type, cmd::doc_intune::ReportType::ComplianceGap);
                assert_eq!(args.top, 10_000);
                assert!(!args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_analyze_log_defaults_and_short_flags() {
        let cli = Cli::parse_from(["ai-it", "analyze-log", "--file", "agent.log"]);
        match cli.command {
            Commands::AnalyzeLog(args) => {
                assert_eq!(args.log_type, cmd::analyze_log::LogTypeHint::Auto);
                assert_eq!(args.top, 200);
                assert!(!args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["ai-it", "analyze-log", "-f", "syslog", "-t", "syslog", "-n", "50", "-s"]);
        match cli.command {
            Commands::AnalyzeLog(args) => {
                assert_eq!(args.log_type, cmd::analyze_log::LogTypeHint::Syslog);
                assert_eq!(args.top, 50);
                assert!(args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_graph_users_top() {
        let cli = Cli::parse_from(["ai-it", "-v", "graph", "users", "--top", "25"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Graph(GraphCommands::Users(args)) => assert_eq!(args.top, 25),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
