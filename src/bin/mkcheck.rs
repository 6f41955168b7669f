//! Runs a single check plugin against saved agent output.
//!
//! Usage:
//!   mkcheck sesam_backup_state dump.txt                  - list discovered items
//!   mkcheck --item daily sesam_backup_state dump.txt     - check one item
//!   mkcheck --host vm01 ovirt_snapshots dump.txt         - check an item-less service
//!
//! The service line is printed the way the monitoring host expects it and the process exits
//! with the state's exit code.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, LevelFilter};
use serde::de::DeserializeOwned;

use mk_plugins::plugins::ovirt::{
    compatibility, hosts, overview, snapshots, storage_domains, vmstats,
};
use mk_plugins::plugins::{hp_icf_xcvr, puppet_agent, sesam_backup_state};
use mk_plugins::section::AgentOutput;
use mk_plugins::{Runner, Service, State, StringTable};

#[derive(Parser)]
#[command(name = "mkcheck")]
#[command(about = "Runs a check plugin against saved agent output", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with discovery or check parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Piggyback host to read sections of, the monitored host itself if empty
    #[arg(long, default_value = "")]
    host: String,

    /// Item to check. Without one, plugins with items list what they discover
    #[arg(long)]
    item: Option<String>,

    /// Current time in seconds since the epoch
    #[arg(long)]
    now: Option<u64>,

    /// More log output on stderr, may be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[arg(value_enum)]
    plugin: Plugin,

    /// File holding the agent output
    agent_output: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Plugin {
    HpIcfXcvr,
    SesamBackupState,
    PuppetAgentEvents,
    PuppetAgentLastrun,
    PuppetAgentResources,
    OvirtOverview,
    OvirtHosts,
    OvirtCompatibility,
    OvirtStorageDomains,
    OvirtSnapshots,
    OvirtSnapshotsEngine,
    OvirtVmstats,
}

impl Plugin {
    fn has_items(self) -> bool {
        matches!(
            self,
            Plugin::HpIcfXcvr
                | Plugin::SesamBackupState
                | Plugin::PuppetAgentResources
                | Plugin::OvirtStorageDomains
                | Plugin::OvirtVmstats
        )
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.item.is_none() && cli.plugin.has_items() {
        match read_output(&cli.agent_output).and_then(|output| discover(&cli, &output)) {
            Ok(items) => {
                for item in items {
                    println!("{}", item);
                }
            }
            Err(err) => {
                println!("{}: {:#}", State::Unknown, err);
                process::exit(State::Unknown.exit_code());
            }
        }
        return;
    }

    Runner::<anyhow::Error>::new()
        .on_error(|err| (State::Unknown, anyhow!("{:#}", err)))
        .safe_run(|| check(&cli, &read_output(&cli.agent_output)?))
        .print_and_exit();
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_output(path: &Path) -> Result<AgentOutput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading agent output from {}", path.display()))?;
    let output = AgentOutput::parse(&text);
    debug!("agent output holds data of {} hosts", output.hosts().count());
    Ok(output)
}

fn load_params<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading parameters from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing parameters in {}", path.display()))
}

fn section<'a>(output: &'a AgentOutput, host: &str, name: &str) -> Result<&'a StringTable> {
    output.section(host, name).with_context(|| {
        if host.is_empty() {
            format!("section {} not found in agent output", name)
        } else {
            format!("section {} not found for host {}", name, host)
        }
    })
}

fn parse_transceivers(output: &AgentOutput, host: &str) -> Result<hp_icf_xcvr::Section> {
    let interfaces = section(output, host, hp_icf_xcvr::INTERFACES_SECTION_NAME)?;
    let transceivers = section(output, host, hp_icf_xcvr::SECTION_NAME)?;
    Ok(hp_icf_xcvr::parse(interfaces, transceivers)?)
}

fn epoch_seconds() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn discover(cli: &Cli, output: &AgentOutput) -> Result<Vec<String>> {
    let host = cli.host.as_str();

    let items = match cli.plugin {
        Plugin::HpIcfXcvr => {
            let params = load_params(cli.params.as_deref())?;
            hp_icf_xcvr::discover(&params, &parse_transceivers(output, host)?)
        }
        Plugin::SesamBackupState => {
            let table = section(output, host, sesam_backup_state::SECTION_NAME)?;
            sesam_backup_state::discover(&sesam_backup_state::parse(table)?)
        }
        Plugin::PuppetAgentResources => {
            let table = section(output, host, puppet_agent::SECTION_NAME)?;
            puppet_agent::discover_resources(&puppet_agent::parse(table))
        }
        Plugin::OvirtStorageDomains => {
            let table = section(output, host, storage_domains::SECTION_NAME)?;
            storage_domains::discover(&storage_domains::parse(table)?)
        }
        Plugin::OvirtVmstats => {
            let table = section(output, host, vmstats::SECTION_NAME)?;
            vmstats::discover(&vmstats::parse(table)?)
        }
        plugin => bail!("{:?} has no items to discover", plugin),
    };

    Ok(items)
}

fn check(cli: &Cli, output: &AgentOutput) -> Result<Service> {
    let host = cli.host.as_str();
    let item = cli.item.as_deref().unwrap_or_default();
    let params = cli.params.as_deref();

    let (name, results) = match cli.plugin {
        Plugin::HpIcfXcvr => (
            hp_icf_xcvr::service_name(item),
            hp_icf_xcvr::check(item, &parse_transceivers(output, host)?),
        ),
        Plugin::SesamBackupState => {
            let table = section(output, host, sesam_backup_state::SECTION_NAME)?;
            (
                sesam_backup_state::service_name(item),
                sesam_backup_state::check(item, &sesam_backup_state::parse(table)?),
            )
        }
        Plugin::PuppetAgentEvents => {
            let values = puppet_agent::parse(section(output, host, puppet_agent::SECTION_NAME)?);
            (
                puppet_agent::EVENTS_SERVICE_NAME.to_owned(),
                puppet_agent::check_events(&load_params(params)?, &values),
            )
        }
        Plugin::PuppetAgentLastrun => {
            let values = puppet_agent::parse(section(output, host, puppet_agent::SECTION_NAME)?);
            let now = match cli.now {
                Some(now) => now,
                None => epoch_seconds()?,
            };
            (
                puppet_agent::LASTRUN_SERVICE_NAME.to_owned(),
                puppet_agent::check_lastrun(&load_params(params)?, &values, now),
            )
        }
        Plugin::PuppetAgentResources => {
            let values = puppet_agent::parse(section(output, host, puppet_agent::SECTION_NAME)?);
            (
                puppet_agent::resource_service_name(item),
                puppet_agent::check_resources(item, &values),
            )
        }
        Plugin::OvirtOverview => {
            let table = section(output, host, overview::SECTION_NAME)?;
            (
                overview::SERVICE_NAME.to_owned(),
                overview::check(&overview::parse(table)?),
            )
        }
        Plugin::OvirtHosts => {
            let table = section(output, host, hosts::SECTION_NAME)?;
            (hosts::SERVICE_NAME.to_owned(), hosts::check(&hosts::parse(table)?))
        }
        Plugin::OvirtCompatibility => {
            let table = section(output, host, compatibility::SECTION_NAME)?;
            (
                compatibility::SERVICE_NAME.to_owned(),
                compatibility::check(&compatibility::parse(table)?),
            )
        }
        Plugin::OvirtStorageDomains => {
            let table = section(output, host, storage_domains::SECTION_NAME)?;
            (
                storage_domains::service_name(item),
                storage_domains::check(
                    item,
                    &load_params(params)?,
                    &storage_domains::parse(table)?,
                ),
            )
        }
        Plugin::OvirtSnapshots => {
            let table = section(output, host, snapshots::SECTION_NAME)?;
            (
                snapshots::SERVICE_NAME.to_owned(),
                snapshots::check(&load_params(params)?, &snapshots::parse(table)?),
            )
        }
        Plugin::OvirtSnapshotsEngine => {
            let table = section(output, host, snapshots::ENGINE_SECTION_NAME)?;
            (
                snapshots::SERVICE_NAME.to_owned(),
                snapshots::check_engine(&load_params(params)?, &snapshots::parse_engine(table)?),
            )
        }
        Plugin::OvirtVmstats => {
            let table = section(output, host, vmstats::SECTION_NAME)?;
            (
                vmstats::service_name(item),
                vmstats::check(item, &vmstats::parse(table)?),
            )
        }
    };

    Ok(Service::new(&name).with_results(results))
}
