//! Agent Registry CLI: `areg` command.
//!
//! Hosts a registry snapshot file and exposes registration, attestation and
//! every read-only query as subcommands. The caller identity of mutating
//! commands is taken from `--caller` as-is; authenticating it is the job of
//! whatever invokes this tool.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use agent_registry::time::micros_to_rfc3339;
use agent_registry::{
    EventLog, Principal, Registry, RegistryConfig, RegistryError, RegistryEvent, RegistryStore,
    StoreLock,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_state_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_else(|| ".".into());
    PathBuf::from(home).join(".agentic").join("registry.json")
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Agent Registry CLI: bind owners to agents and collect attestations.
#[derive(Parser, Debug)]
#[command(
    name = "areg",
    about = "Agent Registry CLI",
    version,
    long_about = "areg, the Agent Registry CLI\n\nRegister owner/agent bindings, collect attestor signatures,\nand query attestation levels."
)]
struct Cli {
    /// Registry snapshot file (default: ~/.agentic/registry.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Print query results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty registry
    Init {
        /// Registrar identity
        #[arg(long, required_unless_present = "config")]
        registrar: Option<Principal>,

        /// Attestor identity (repeat in order: first, second, ...)
        #[arg(long = "attestor")]
        attestors: Vec<Principal>,

        /// Read the configuration from a JSON file instead
        #[arg(long, conflicts_with_all = ["registrar", "attestors"])]
        config: Option<PathBuf>,

        /// Overwrite an existing registry
        #[arg(long)]
        force: bool,
    },

    /// Bind an owner to an agent (registrar only)
    Register {
        /// Calling identity
        #[arg(long)]
        caller: Principal,

        /// Owner identity
        #[arg(long)]
        owner: Principal,

        /// Agent identity
        #[arg(long)]
        agent: Principal,
    },

    /// Sign an owner's binding (attestors only)
    Attest {
        /// Calling identity
        #[arg(long)]
        caller: Principal,

        /// Owner identity
        #[arg(long)]
        owner: Principal,
    },

    /// Show owner, agent and attestation level
    Info {
        #[arg(long)]
        owner: Principal,
    },

    /// Show the attestation level
    Level {
        #[arg(long)]
        owner: Principal,
    },

    /// Check whether an account reaches an attestation level
    Attested {
        #[arg(long)]
        owner: Principal,

        /// Minimum attestation level
        #[arg(long)]
        threshold: u32,
    },

    /// Check whether an attestor has signed an account
    Signed {
        #[arg(long)]
        owner: Principal,

        #[arg(long)]
        attestor: Principal,
    },

    /// Show per-attestor signature flags for an account
    Attestors {
        #[arg(long)]
        owner: Principal,
    },

    /// Look up an account by owner or by agent
    Lookup {
        #[arg(long, required_unless_present = "agent", conflicts_with = "agent")]
        owner: Option<Principal>,

        #[arg(long)]
        agent: Option<Principal>,
    },

    /// Check whether an identity is a configured attestor
    IsAttestor {
        identity: Principal,
    },

    /// Show the registry configuration
    Config,

    /// List all accounts
    List,

    /// Derive a principal from a base64 Ed25519 public key
    Principal {
        #[arg(long)]
        public_key: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let state = cli.state.clone().unwrap_or_else(default_state_path);
    let out = Output { json: cli.json };

    let result = match cli.command {
        Commands::Init {
            registrar,
            attestors,
            config,
            force,
        } => cmd_init(&state, registrar, attestors, config.as_deref(), force, &out),
        Commands::Register {
            caller,
            owner,
            agent,
        } => cmd_register(&state, &caller, owner, agent, &out),
        Commands::Attest { caller, owner } => cmd_attest(&state, &caller, &owner, &out),
        Commands::Info { owner } => cmd_info(&state, &owner, &out),
        Commands::Level { owner } => cmd_level(&state, &owner, &out),
        Commands::Attested { owner, threshold } => cmd_attested(&state, &owner, threshold, &out),
        Commands::Signed { owner, attestor } => cmd_signed(&state, &owner, &attestor, &out),
        Commands::Attestors { owner } => cmd_attestors(&state, &owner, &out),
        Commands::Lookup { owner, agent } => cmd_lookup(&state, owner, agent, &out),
        Commands::IsAttestor { identity } => cmd_is_attestor(&state, &identity, &out),
        Commands::Config => cmd_config(&state, &out),
        Commands::List => cmd_list(&state, &out),
        Commands::Principal { public_key } => cmd_principal(&public_key, &out),
    };

    if let Err(e) = result {
        match e.downcast_ref::<RegistryError>() {
            Some(re) => eprintln!("error ({}): {e:#}", re.code()),
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}

// ── Output helpers ────────────────────────────────────────────────────────────

struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or `text` in human mode.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

/// Print each emitted event as one JSON line.
fn print_events(events: &[RegistryEvent]) -> Result<()> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

// ── Registry helpers ──────────────────────────────────────────────────────────

fn open(state: &Path) -> Result<(RegistryStore, Registry<EventLog>)> {
    let store = RegistryStore::new(state);
    if !store.exists() {
        return Err(missing(state));
    }
    let registry = load(&store, state)?;
    Ok((store, registry))
}

/// Like [`open`], but holds the snapshot lock until the returned guard is
/// dropped. Mutating commands keep it from load through save.
fn open_locked(state: &Path) -> Result<(StoreLock, RegistryStore, Registry<EventLog>)> {
    let store = RegistryStore::new(state);
    if !store.exists() {
        return Err(missing(state));
    }
    let lock = store
        .lock()
        .with_context(|| format!("failed to lock registry at {}", state.display()))?;
    let registry = load(&store, state)?;
    Ok((lock, store, registry))
}

fn missing(state: &Path) -> anyhow::Error {
    anyhow!("no registry at {} (run `areg init` first)", state.display())
}

fn load(store: &RegistryStore, state: &Path) -> Result<Registry<EventLog>> {
    let registry = store
        .load()
        .with_context(|| format!("failed to load registry from {}", state.display()))?;
    log::debug!(
        "opened registry at {} ({} account(s))",
        state.display(),
        registry.len()
    );
    Ok(registry)
}

// ── Command implementations ───────────────────────────────────────────────────

/// `areg init --registrar ID [--attestor ID]... | --config FILE`
fn cmd_init(
    state: &Path,
    registrar: Option<Principal>,
    attestors: Vec<Principal>,
    config_path: Option<&Path>,
    force: bool,
    out: &Output,
) -> Result<()> {
    let config = match (config_path, registrar) {
        (Some(path), _) => RegistryConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        (None, Some(registrar)) => RegistryConfig::new(registrar, attestors)?,
        (None, None) => return Err(anyhow!("either --registrar or --config is required")),
    };

    let store = RegistryStore::new(state);
    let _lock = store
        .lock()
        .with_context(|| format!("failed to lock registry at {}", state.display()))?;
    if store.exists() {
        if !force {
            return Err(anyhow!(
                "registry already exists at {} (use --force to overwrite)",
                state.display()
            ));
        }
        log::warn!("overwriting registry at {}", state.display());
    }

    let registry = Registry::new(config);
    store.save(&registry).context("failed to save registry")?;

    let config = registry.get_registry_config();
    out.emit(config, || {
        format!(
            "Created registry at {}\n  Registrar: {}\n  Attestors: {}\n  Max level: {}",
            state.display(),
            config.registrar(),
            config.attestors().len(),
            config.max_attestation_level()
        )
    })
}

/// `areg register --caller ID --owner ID --agent ID`
fn cmd_register(
    state: &Path,
    caller: &Principal,
    owner: Principal,
    agent: Principal,
    out: &Output,
) -> Result<()> {
    let (_lock, store, mut registry) = open_locked(state)?;
    let ack = registry.register(caller, owner.clone(), agent.clone())?;
    store.save(&registry).context("failed to save registry")?;

    if !out.json {
        println!("Registered {owner} -> {agent} (acknowledged by {ack})");
    }
    print_events(&registry.sink_mut().drain())
}

/// `areg attest --caller ID --owner ID`
fn cmd_attest(state: &Path, caller: &Principal, owner: &Principal, out: &Output) -> Result<()> {
    let (_lock, store, mut registry) = open_locked(state)?;
    let level = registry.attest(caller, owner)?;
    store.save(&registry).context("failed to save registry")?;

    if !out.json {
        let max = registry.get_registry_config().max_attestation_level();
        println!("Attested {owner} as {caller}: level {level}/{max}");
    }
    print_events(&registry.sink_mut().drain())
}

/// `areg info --owner ID`
fn cmd_info(state: &Path, owner: &Principal, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let info = registry.get_account_info(owner);
    let registered_at = registry.get_record(owner).map(|r| r.registered_at);

    out.emit(&info, || match (&info, registered_at) {
        (Some(info), Some(at)) => format!(
            "Account: {}\n  Agent:      {}\n  Level:      {}/{}\n  Registered: {}",
            info.owner,
            info.agent,
            info.attestation_level,
            registry.get_registry_config().max_attestation_level(),
            micros_to_rfc3339(at)
        ),
        _ => format!("No account for owner {owner}"),
    })
}

/// `areg level --owner ID`
fn cmd_level(state: &Path, owner: &Principal, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let level = registry.get_attestation_level(owner);
    out.emit(&level, || match level {
        Some(level) => level.to_string(),
        None => "none".to_string(),
    })
}

/// `areg attested --owner ID --threshold N`
fn cmd_attested(state: &Path, owner: &Principal, threshold: u32, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let attested = registry.is_account_attested(owner, threshold);
    out.emit(&attested, || attested.to_string())
}

/// `areg signed --owner ID --attestor ID`
fn cmd_signed(state: &Path, owner: &Principal, attestor: &Principal, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let signed = registry.has_attestor_signed(owner, attestor);
    out.emit(&signed, || signed.to_string())
}

/// `areg attestors --owner ID`
fn cmd_attestors(state: &Path, owner: &Principal, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let flags = registry.get_account_attestors(owner);

    out.emit(&flags, || match &flags {
        Some(flags) => {
            let mut lines = vec![format!("Attestors for {owner}:")];
            lines.push(format!("  attestor-registrar: {}", flags.registrar));
            for status in &flags.attestors {
                lines.push(format!(
                    "  {}: {} ({})",
                    status.slot_name(),
                    status.signed,
                    status.attestor
                ));
            }
            lines.join("\n")
        }
        None => format!("No account for owner {owner}"),
    })
}

/// `areg lookup (--owner ID | --agent ID)`
fn cmd_lookup(
    state: &Path,
    owner: Option<Principal>,
    agent: Option<Principal>,
    out: &Output,
) -> Result<()> {
    let (_, registry) = open(state)?;
    let ack = match (&owner, &agent) {
        (Some(owner), _) => registry.get_account_by_owner(owner),
        (None, Some(agent)) => registry.get_account_by_agent(agent),
        (None, None) => return Err(anyhow!("either --owner or --agent is required")),
    };

    out.emit(&ack, || match ack {
        Some(registrar) => format!("registered (registrar {registrar})"),
        None => "none".to_string(),
    })
}

/// `areg is-attestor ID`
fn cmd_is_attestor(state: &Path, identity: &Principal, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let is_attestor = registry.is_attestor(identity);
    out.emit(&is_attestor, || is_attestor.to_string())
}

/// `areg config`
fn cmd_config(state: &Path, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let config = registry.get_registry_config();

    out.emit(config, || {
        let mut lines = vec![format!("Registrar: {}", config.registrar())];
        for (i, attestor) in config.attestors().iter().enumerate() {
            lines.push(format!("  attestor-{}: {attestor}", i + 1));
        }
        lines.push(format!(
            "Max attestation level: {}",
            config.max_attestation_level()
        ));
        lines.join("\n")
    })
}

/// `areg list`
fn cmd_list(state: &Path, out: &Output) -> Result<()> {
    let (_, registry) = open(state)?;
    let records: Vec<_> = registry.accounts().iter().collect();
    let max = registry.get_registry_config().max_attestation_level();

    out.emit(&records, || {
        if records.is_empty() {
            return "No accounts registered.".to_string();
        }
        let mut lines = vec![format!("{} account(s):", records.len())];
        for r in &records {
            lines.push(format!(
                "  {} -> {}  level {}/{}  registered {}",
                r.owner,
                r.agent,
                r.attestation_level,
                max,
                micros_to_rfc3339(r.registered_at)
            ));
        }
        lines.join("\n")
    })
}

/// `areg principal --public-key BASE64`
fn cmd_principal(public_key: &str, out: &Output) -> Result<()> {
    let principal = Principal::from_public_key_base64(public_key)?;
    out.emit(&principal, || principal.to_string())
}
