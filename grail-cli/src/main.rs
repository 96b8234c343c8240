mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use grail_core::{
    AccountTemplate, GrailConfig, GrailEngine, GrailMode, GrailPatch, ItemPath, ItemRecord,
    JsonDirStore, NewAccount, SortKey, Token,
};

use report::Reporter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Colored tables for humans
    Console,
    /// Pretty JSON, suitable for piping
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "grail", version)]
#[command(about = "Track holy grail checklists and party progress from the command line")]
struct Args {
    /// Directory holding account and party documents
    #[arg(long, env = "GRAIL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, env = "GRAIL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new account
    Create {
        address: String,
        #[arg(long)]
        password: String,
        /// Seed the checklists from an exported account JSON
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Show an account, including its current token
    Show { address: String },
    /// Print one checklist with every catalog slot filled in, as JSON
    Checklist {
        address: String,
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
    },
    /// Mark (or unmark) one item
    Mark {
        address: String,
        /// Item path such as `runes/Ber`
        path: String,
        #[arg(long)]
        password: String,
        /// Token from the last read; the current token is used when omitted
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        perfect: bool,
        /// Clear the found flag instead of setting it
        #[arg(long)]
        unfound: bool,
    },
    /// Replace the settings blob
    Settings {
        address: String,
        /// Settings as a JSON document
        settings: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Per-category statistics for one account
    Stats {
        address: String,
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
    },
    /// Manage and view parties
    Party {
        #[command(subcommand)]
        command: PartyCommand,
    },
    /// Accounts and recent activity across the site
    Site,
    /// Categories and slot counts of a catalog
    Catalog {
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
    },
}

#[derive(Debug, Subcommand)]
enum PartyCommand {
    /// Start a party led by this account
    Create {
        leader: String,
        #[arg(long)]
        password: String,
    },
    /// Add an existing account to the party
    Add {
        leader: String,
        member: String,
        #[arg(long)]
        password: String,
    },
    /// Remove a member from the party
    Remove {
        leader: String,
        member: String,
        #[arg(long)]
        password: String,
    },
    /// Merged read-only view of every member's checklist
    Show {
        leader: String,
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
    },
    /// Rank members by missing items or score
    Leaderboard {
        leader: String,
        #[arg(long, default_value = "holy")]
        mode: GrailMode,
        /// `total`, `itemScore`, or a category key such as `runes`
        #[arg(long, default_value = "total")]
        sort: SortKey,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;
    let store = JsonDirStore::open(&config.data_dir)
        .with_context(|| format!("opening data dir {}", config.data_dir.display()))?;
    let engine = GrailEngine::new(store, config);
    let reporter = Reporter::new(args.format);
    run(&engine, &reporter, args.command)
}

fn load_config(args: &Args) -> Result<GrailConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GrailConfig::from_json(&raw).context("parsing config")?
        }
        None => GrailConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir.clone_from(dir);
    }
    Ok(config)
}

fn current_token(
    engine: &GrailEngine<JsonDirStore>,
    address: &str,
    token: Option<String>,
) -> Result<Token> {
    match token {
        Some(token) => Ok(Token::from(token)),
        None => Ok(engine.get(address)?.token),
    }
}

fn run(engine: &GrailEngine<JsonDirStore>, reporter: &Reporter, command: Command) -> Result<()> {
    match command {
        Command::Create {
            address,
            password,
            template,
        } => {
            let mut request = NewAccount::new(address, password);
            if let Some(path) = template {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))?;
                let template: AccountTemplate =
                    serde_json::from_str(&raw).context("parsing template")?;
                request = request.with_template(template);
            }
            let view = engine.create_account(request)?;
            reporter.account(&view)
        }
        Command::Show { address } => reporter.account(&engine.get(&address)?),
        Command::Checklist { address, mode } => {
            reporter.checklist(&engine.checklist(&address, mode)?)
        }
        Command::Mark {
            address,
            path,
            password,
            token,
            mode,
            note,
            perfect,
            unfound,
        } => {
            let token = current_token(engine, &address, token)?;
            let record = ItemRecord {
                was_found: !unfound,
                is_perfect: perfect,
                note: note.unwrap_or_default(),
            };
            let path = ItemPath::parse(&path);
            let view = engine.update_item(&address, &password, &token, mode, path, record)?;
            reporter.account(&view)
        }
        Command::Settings {
            address,
            settings,
            password,
            token,
        } => {
            let settings = serde_json::from_str(&settings).context("parsing settings")?;
            let token = current_token(engine, &address, token)?;
            let view = engine.apply_patch(
                &address,
                &password,
                &token,
                GrailPatch::Settings(Some(settings)),
            )?;
            reporter.account(&view)
        }
        Command::Stats { address, mode } => {
            let stats = engine.stats(&address, mode)?;
            let progress = engine.progress(&address, mode)?;
            reporter.stats(&address, mode, &stats, &progress)
        }
        Command::Party { command } => run_party(engine, reporter, command),
        Command::Site => reporter.site(&engine.site_statistics(chrono::Utc::now())?),
        Command::Catalog { mode } => reporter.catalog(engine.catalog(mode)),
    }
}

fn run_party(
    engine: &GrailEngine<JsonDirStore>,
    reporter: &Reporter,
    command: PartyCommand,
) -> Result<()> {
    match command {
        PartyCommand::Create { leader, password } => {
            reporter.roster(&engine.create_party(&leader, &password)?)
        }
        PartyCommand::Add {
            leader,
            member,
            password,
        } => reporter.roster(&engine.add_party_member(&leader, &password, &member)?),
        PartyCommand::Remove {
            leader,
            member,
            password,
        } => reporter.roster(&engine.remove_party_member(&leader, &password, &member)?),
        PartyCommand::Show { leader, mode } => {
            reporter.party(&engine.party_view(&leader)?, mode)
        }
        PartyCommand::Leaderboard { leader, mode, sort } => {
            let board = engine.leaderboard(&leader, mode, sort)?;
            if board.rows.is_empty() {
                bail!("party led by {leader} has no members");
            }
            reporter.leaderboard(&board)
        }
    }
}
