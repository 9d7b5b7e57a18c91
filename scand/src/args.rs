use clap::{Arg, ArgAction, Command, arg};
use serde::Deserialize;
use shardscan_ledger_core::{WorkchainId, shard::BASECHAIN_ID};
use shardscan_scanner::ScanConfig;
use shardscan_simulator::SimulatorParams;
use std::{ffi::OsString, fs, time::Duration};
use toml::from_str;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Args {
    // NOTE: property names match config file fields
    pub appdir: Option<String>,
    pub logdir: Option<String>,
    #[serde(rename = "nologfiles")]
    pub no_log_files: bool,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    pub async_threads: usize,
    pub output: Option<String>,
    pub no_master_records: bool,
    pub max_masters: Option<u64>,
    pub monitor_interval_sec: u64,

    pub sim_seed: u64,
    pub sim_interval_ms: u64,
    pub sim_split_probability: f64,
    pub sim_merge_probability: f64,
    pub sim_max_split_depth: u8,
    pub sim_max_blocks_per_step: u32,
    pub sim_workchains: Vec<WorkchainId>,
}

impl Default for Args {
    fn default() -> Self {
        let sim = SimulatorParams::default();
        Self {
            appdir: None,
            logdir: None,
            no_log_files: false,
            log_level: "info".into(),
            async_threads: 2,
            output: None,
            no_master_records: false,
            max_masters: None,
            monitor_interval_sec: 10,

            sim_seed: sim.seed,
            sim_interval_ms: sim.interval.as_millis() as u64,
            sim_split_probability: sim.split_probability,
            sim_merge_probability: sim.merge_probability,
            sim_max_split_depth: sim.max_split_depth,
            sim_max_blocks_per_step: sim.max_blocks_per_step,
            sim_workchains: vec![BASECHAIN_ID],
        }
    }
}

impl Args {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(!self.no_master_records, self.max_masters)
    }

    pub fn simulator_params(&self) -> SimulatorParams {
        SimulatorParams {
            seed: self.sim_seed,
            interval: Duration::from_millis(self.sim_interval_ms),
            split_probability: self.sim_split_probability,
            merge_probability: self.sim_merge_probability,
            max_split_depth: self.sim_max_split_depth,
            max_blocks_per_step: self.sim_max_blocks_per_step,
            workchains: self.sim_workchains.clone(),
        }
    }
}

pub fn cli() -> Command {
    let defaults: Args = Default::default();

    #[allow(clippy::let_and_return)]
    let cmd = Command::new("shardscand")
        .about(format!("{} v{}", env!("CARGO_PKG_DESCRIPTION"), env!("CARGO_PKG_VERSION")))
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(-C --configfile <CONFIG_FILE> "Path of config file."))
        .arg(arg!(-b --appdir <DATA_DIR> "Directory to store logs and records."))
        .arg(arg!(--logdir <LOG_DIR> "Directory to log output."))
        .arg(arg!(--nologfiles "Disable logging to files."))
        .arg(
            Arg::new("log_level")
                .short('d')
                .long("loglevel")
                .env("SHARDSCAND_LOG_LEVEL")
                .value_name("LEVEL")
                .default_value("info")
                .require_equals(true)
                .help(concat!(
                    "Logging level for all subsystems {off, error, warn, info, debug, trace}\n",
                    "-- You may also specify <subsystem>=<level>,<subsystem2>=<level>,... to set per-subsystem levels."
                )),
        )
        .arg(
            Arg::new("async_threads")
                .short('t')
                .long("async-threads")
                .env("SHARDSCAND_ASYNC_THREADS")
                .value_name("async_threads")
                .require_equals(true)
                .value_parser(clap::value_parser!(usize))
                .help(format!("Specify number of async threads (default: {}).", defaults.async_threads)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .env("SHARDSCAND_OUTPUT")
                .value_name("FILE")
                .require_equals(true)
                .help("JSON Lines file receiving one record per scanned block (default: <appdir>/records.jsonl)."),
        )
        .arg(arg!(--"no-master-records" "Only record shard blocks, not the master blocks referencing them."))
        .arg(
            Arg::new("max-masters")
                .long("max-masters")
                .value_name("COUNT")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help("Stop after scanning this many master blocks."),
        )
        .arg(
            Arg::new("monitor-interval-sec")
                .long("monitor-interval-sec")
                .value_name("SECONDS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!(
                    "Interval between scan progress reports, 0 disables them (default: {}).",
                    defaults.monitor_interval_sec
                )),
        )
        .arg(
            Arg::new("sim-seed")
                .long("sim-seed")
                .env("SHARDSCAND_SIM_SEED")
                .value_name("SEED")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help("Seed of the simulated ledger."),
        )
        .arg(
            Arg::new("sim-interval-ms")
                .long("sim-interval-ms")
                .value_name("MILLIS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Time between simulated master blocks (default: {}).", defaults.sim_interval_ms)),
        )
        .arg(
            Arg::new("sim-split-probability")
                .long("sim-split-probability")
                .value_name("P")
                .require_equals(true)
                .value_parser(clap::value_parser!(f64))
                .help(format!("Chance of a shard splitting per master block (default: {}).", defaults.sim_split_probability)),
        )
        .arg(
            Arg::new("sim-merge-probability")
                .long("sim-merge-probability")
                .value_name("P")
                .require_equals(true)
                .value_parser(clap::value_parser!(f64))
                .help(format!("Chance of two sibling shards merging per master block (default: {}).", defaults.sim_merge_probability)),
        )
        .arg(
            Arg::new("sim-max-split-depth")
                .long("sim-max-split-depth")
                .value_name("DEPTH")
                .require_equals(true)
                .value_parser(clap::value_parser!(u8))
                .help(format!("Deepest shard split the simulator produces (default: {}).", defaults.sim_max_split_depth)),
        )
        .arg(
            Arg::new("sim-max-blocks-per-step")
                .long("sim-max-blocks-per-step")
                .value_name("COUNT")
                .require_equals(true)
                .value_parser(clap::value_parser!(u32))
                .help(format!("Most blocks one shard produces per master block (default: {}).", defaults.sim_max_blocks_per_step)),
        )
        .arg(
            Arg::new("sim-workchains")
                .long("sim-workchains")
                .value_name("WORKCHAIN")
                .require_equals(true)
                .value_delimiter(',')
                .action(ArgAction::Append)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(WorkchainId))
                .help("Comma separated workchains to simulate (default: 0)."),
        );

    cmd
}

pub fn parse_args() -> Args {
    match Args::parse(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    }
}

impl Args {
    pub fn parse<I, T>(itr: I) -> Result<Args, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m: clap::ArgMatches = cli().try_get_matches_from(itr)?;
        let mut defaults: Args = Default::default();

        if let Some(config_file) = m.get_one::<String>("configfile") {
            let config_str = fs::read_to_string(config_file)?;
            defaults = from_str(&config_str).map_err(|toml_error| {
                clap::Error::raw(
                    clap::error::ErrorKind::ValueValidation,
                    format!("failed parsing config file, reason: {}", toml_error.message()),
                )
            })?;
        }

        let args = Args {
            appdir: m.get_one::<String>("appdir").cloned().or(defaults.appdir),
            logdir: m.get_one::<String>("logdir").cloned().or(defaults.logdir),
            no_log_files: arg_match_unwrap_or::<bool>(&m, "nologfiles", defaults.no_log_files),
            log_level: arg_match_unwrap_or::<String>(&m, "log_level", defaults.log_level),
            async_threads: arg_match_unwrap_or::<usize>(&m, "async_threads", defaults.async_threads),
            output: m.get_one::<String>("output").cloned().or(defaults.output),
            no_master_records: arg_match_unwrap_or::<bool>(&m, "no-master-records", defaults.no_master_records),
            max_masters: m.get_one::<u64>("max-masters").cloned().or(defaults.max_masters),
            monitor_interval_sec: arg_match_unwrap_or::<u64>(&m, "monitor-interval-sec", defaults.monitor_interval_sec),

            sim_seed: arg_match_unwrap_or::<u64>(&m, "sim-seed", defaults.sim_seed),
            sim_interval_ms: arg_match_unwrap_or::<u64>(&m, "sim-interval-ms", defaults.sim_interval_ms),
            sim_split_probability: arg_match_unwrap_or::<f64>(&m, "sim-split-probability", defaults.sim_split_probability),
            sim_merge_probability: arg_match_unwrap_or::<f64>(&m, "sim-merge-probability", defaults.sim_merge_probability),
            sim_max_split_depth: arg_match_unwrap_or::<u8>(&m, "sim-max-split-depth", defaults.sim_max_split_depth),
            sim_max_blocks_per_step: arg_match_unwrap_or::<u32>(&m, "sim-max-blocks-per-step", defaults.sim_max_blocks_per_step),
            sim_workchains: arg_match_many_unwrap_or::<WorkchainId>(&m, "sim-workchains", defaults.sim_workchains),
        };

        Ok(args)
    }
}

use clap::parser::ValueSource::DefaultValue;
use std::marker::{Send, Sync};
fn arg_match_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: T) -> T {
    m.get_one::<T>(arg_id).cloned().filter(|_| m.value_source(arg_id) != Some(DefaultValue)).unwrap_or(default)
}

fn arg_match_many_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: Vec<T>) -> Vec<T> {
    match m.get_many::<T>(arg_id) {
        Some(val_ref) => val_ref.cloned().collect(),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse(["shardscand"]).unwrap();
        assert_eq!(args.log_level, "info");
        assert_eq!(args.sim_workchains, vec![BASECHAIN_ID]);
        assert_eq!(args.scan_config(), ScanConfig::default());
        assert_eq!(args.simulator_params(), SimulatorParams::default());
    }

    #[test]
    fn test_cli_flags() {
        let args = Args::parse([
            "shardscand",
            "--nologfiles",
            "--loglevel=debug,shardscan_scanner=trace",
            "--output=/tmp/records.jsonl",
            "--no-master-records",
            "--max-masters=25",
            "--sim-seed=7",
            "--sim-workchains=0,-5",
            "--sim-split-probability=0.25",
        ])
        .unwrap();

        assert!(args.no_log_files);
        assert_eq!(args.log_level, "debug,shardscan_scanner=trace");
        assert_eq!(args.output.as_deref(), Some("/tmp/records.jsonl"));
        assert_eq!(args.scan_config(), ScanConfig::new(false, Some(25)));
        let params = args.simulator_params();
        assert_eq!(params.seed, 7);
        assert_eq!(params.workchains, vec![0, -5]);
        assert_eq!(params.split_probability, 0.25);
    }

    #[test]
    fn test_config_file_with_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shardscand.toml");
        fs::write(
            &path,
            r#"
loglevel = "warn"
max-masters = 10
sim-seed = 99
sim-interval-ms = 5
sim-workchains = [0, 1]
"#,
        )
        .unwrap();
        let config_arg = format!("--configfile={}", path.display());

        let args = Args::parse(["shardscand", config_arg.as_str(), "--sim-seed=3"]).unwrap();

        assert_eq!(args.log_level, "warn");
        assert_eq!(args.max_masters, Some(10));
        assert_eq!(args.sim_seed, 3);
        assert_eq!(args.sim_interval_ms, 5);
        assert_eq!(args.sim_workchains, vec![0, 1]);
    }

    #[test]
    fn test_config_file_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shardscand.toml");
        fs::write(&path, "no-such-option = true\n").unwrap();
        let config_arg = format!("--configfile={}", path.display());

        assert!(Args::parse(["shardscand", config_arg.as_str()]).is_err());
    }
}
