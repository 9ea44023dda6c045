use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scheme_eligibility::config::{Config, ConfigOverrides};
use scheme_eligibility::eligibility::{evaluate_scheme, explain, SchemeVerdict};
use scheme_eligibility::extract::Extractor;
use scheme_eligibility::output::csv::{
    ingest_to_csv, predicates_to_csv, rankings_to_csv, verdicts_to_csv,
};
use scheme_eligibility::output::json::render_json;
use scheme_eligibility::output::table::{
    render_explain_table, render_ingest_table, render_predicates_table, render_rankings_table,
    render_rules_table, render_verdicts_table,
};
use scheme_eligibility::predicate::Predicate;
use scheme_eligibility::profile::UserProfile;
use scheme_eligibility::ranking::{rank, MatchResult};
use scheme_eligibility::scheme::Scheme;
use scheme_eligibility::server::run_server;
use scheme_eligibility::source::source_for;
use scheme_eligibility::store::{ingest, IngestReport, SchemeStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "scheme-eligibility",
    about = "Extract, rank and check eligibility for government welfare schemes"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Scheme records: JSON file path or http(s) URL.
    #[arg(short, long)]
    schemes: Option<String>,
    /// Rule book TOML replacing the built-in extraction rules.
    #[arg(short, long)]
    rules: Option<String>,
    #[arg(long)]
    db: Option<String>,
    #[arg(short, long)]
    limit: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct ProfileArgs {
    /// JSON file with a user profile; individual flags override its fields.
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    occupation: Option<String>,
    #[arg(long)]
    education: Option<String>,
    #[arg(long = "caste-category")]
    caste_category: Option<String>,
    #[arg(long)]
    income: Option<u64>,
    #[arg(long = "marital-status")]
    marital_status: Option<String>,
    #[arg(long)]
    state: Option<String>,
}

impl ProfileArgs {
    fn resolve(&self) -> Result<UserProfile> {
        let base = match &self.profile {
            Some(path) => read_profile(path)?,
            None => UserProfile::default(),
        };
        Ok(base.merge(UserProfile {
            age: self.age,
            gender: self.gender.clone(),
            occupation: self.occupation.clone(),
            education: self.education.clone(),
            caste_category: self.caste_category.clone(),
            income: self.income,
            marital_status: self.marital_status.clone(),
            state: self.state.clone(),
        }))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Turn eligibility text into structured predicates.
    Extract {
        text: Option<String>,
        /// File with one eligibility clause per line.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        ministry: Option<String>,
    },
    /// Rank schemes by relevance to a profile.
    Rank {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Rank the schemes in the local store instead of the source.
        #[arg(long)]
        stored: bool,
    },
    /// Strict eligibility verdicts with reasons.
    Evaluate {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Only schemes whose id, link or name matches.
        #[arg(long)]
        scheme: Option<String>,
        /// Show every clause's outcome instead of the verdict.
        #[arg(long)]
        explain: bool,
        #[arg(long)]
        stored: bool,
    },
    /// Extract and store schemes from the source.
    Ingest,
    /// Show the active extraction rules.
    Rules {
        /// Print the rule book as TOML, ready to edit.
        #[arg(long)]
        dump: bool,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        schemes: cli.schemes.clone(),
        rules_path: cli.rules.clone(),
        db_path: cli.db.clone(),
        limit: cli.limit,
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        let bind = config.bind_address();
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let extractor = config.extractor()?;

    match &cli.command {
        Commands::Extract {
            text,
            file,
            region,
            ministry,
        } => {
            let clauses = read_clauses(text.as_deref(), file.as_deref())?;
            let predicates =
                extractor.extract_all(&clauses, region.as_deref(), ministry.as_deref());
            print_predicates(&predicates, cli.output)?;
        }
        Commands::Rank { profile, stored } => {
            let user = profile.resolve()?;
            let schemes = load_schemes(&config, &extractor, *stored).await?;
            let ranked = rank(&user, &schemes, config.ranking.limit);
            if ranked.is_empty() {
                info!(candidates = schemes.len(), "no scheme matched the profile");
            }
            print_rankings(&ranked, cli.output)?;
        }
        Commands::Evaluate {
            profile,
            scheme,
            explain: show_clauses,
            stored,
        } => {
            let user = profile.resolve()?;
            let mut schemes = load_schemes(&config, &extractor, *stored).await?;
            if let Some(wanted) = scheme {
                schemes.retain(|s| scheme_matches(s, wanted));
                if schemes.is_empty() {
                    return Err(anyhow!("no scheme matches {wanted}"));
                }
            }
            if *show_clauses {
                print_explanations(&user, &schemes, cli.output)?;
            } else {
                let verdicts: Vec<SchemeVerdict> = schemes
                    .iter()
                    .map(|s| SchemeVerdict {
                        scheme: s.display_name(),
                        verdict: evaluate_scheme(&user, s),
                    })
                    .collect();
                print_verdicts(&verdicts, cli.output)?;
            }
        }
        Commands::Ingest => {
            let location = config.resolved_schemes();
            let schemes = source_for(&location).fetch().await?;
            let store = SchemeStore::open(&config.resolved_db_path())?;
            let report = ingest(&store, &schemes, &extractor)?;
            print_ingest(&report, cli.output)?;
        }
        Commands::Rules { dump } => {
            let book = extractor.rules().book();
            if *dump {
                println!("{}", book.to_toml()?);
            } else {
                match cli.output {
                    OutputFormat::Table => println!("{}", render_rules_table(book)),
                    OutputFormat::Json => println!("{}", render_json(book)?),
                    OutputFormat::Csv => {
                        warn!("CSV output for rules not implemented, using JSON");
                        println!("{}", render_json(book)?);
                    }
                }
            }
        }
        Commands::Serve { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn read_profile(path: &Path) -> Result<UserProfile> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading profile: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed parsing profile JSON: {}", path.display()))
}

fn read_clauses(text: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut clauses: Vec<String> = text.into_iter().map(str::to_string).collect();
    if let Some(path) = file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading clauses: {}", path.display()))?;
        clauses.extend(
            data.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    if clauses.is_empty() {
        return Err(anyhow!("provide eligibility text or --file"));
    }
    Ok(clauses)
}

/// Schemes with raw eligibility text already extracted.
async fn load_schemes(config: &Config, extractor: &Extractor, stored: bool) -> Result<Vec<Scheme>> {
    if stored {
        let store = SchemeStore::open(&config.resolved_db_path())?;
        return Ok(store.load_all()?.into_iter().map(|s| s.scheme).collect());
    }
    let location = config.resolved_schemes();
    let schemes = source_for(&location).fetch().await?;
    Ok(schemes.iter().map(|s| s.resolve(extractor)).collect())
}

fn scheme_matches(scheme: &Scheme, wanted: &str) -> bool {
    let wanted = wanted.trim();
    [scheme.key(), scheme.name.clone(), scheme.link.clone()]
        .into_iter()
        .flatten()
        .any(|candidate| candidate.eq_ignore_ascii_case(wanted))
}

fn print_predicates(predicates: &[Predicate], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_predicates_table(predicates)),
        OutputFormat::Json => println!("{}", render_json(predicates)?),
        OutputFormat::Csv => println!("{}", predicates_to_csv(predicates)?),
    }
    Ok(())
}

fn print_rankings(results: &[MatchResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_rankings_table(results)),
        OutputFormat::Json => println!("{}", render_json(results)?),
        OutputFormat::Csv => println!("{}", rankings_to_csv(results)?),
    }
    Ok(())
}

fn print_verdicts(verdicts: &[SchemeVerdict], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_verdicts_table(verdicts)),
        OutputFormat::Json => println!("{}", render_json(verdicts)?),
        OutputFormat::Csv => println!("{}", verdicts_to_csv(verdicts)?),
    }
    Ok(())
}

fn print_explanations(user: &UserProfile, schemes: &[Scheme], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for scheme in schemes {
                let outcomes = explain(user, scheme.predicates());
                println!("{}", render_explain_table(&scheme.display_name(), &outcomes));
            }
        }
        OutputFormat::Json | OutputFormat::Csv => {
            if matches!(format, OutputFormat::Csv) {
                warn!("CSV output for explain not implemented, using JSON");
            }
            let explained: Vec<_> = schemes
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "scheme": s.display_name(),
                        "outcomes": explain(user, s.predicates()),
                    })
                })
                .collect();
            println!("{}", render_json(&explained)?);
        }
    }
    Ok(())
}

fn print_ingest(report: &IngestReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_ingest_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => println!("{}", ingest_to_csv(report)?),
    }
    Ok(())
}
