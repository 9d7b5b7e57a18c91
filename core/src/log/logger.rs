use log::LevelFilter;
use log4rs::config::runtime::ConfigErrors;
use std::{collections::BTreeMap, env, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid logging spec '{0}'")]
    ParseFilterSpec(String),

    #[error("log appender error: {0}")]
    Appender(String),

    #[error(transparent)]
    Config(#[from] ConfigErrors),

    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}

/// Parsed form of a filter expression such as `info,shardscan_scanner=debug,shardscan_simulator`.
///
/// A bare level sets the root level, `module=level` sets a module level and a bare
/// module name enables everything for that module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    root: Option<LevelFilter>,
    modules: BTreeMap<String, LevelFilter>,
}

impl FilterSpec {
    const DEFAULT_ROOT_LEVEL: LevelFilter = LevelFilter::Info;

    /// Reads the spec from an environment variable. Invalid entries are skipped
    /// with a notice on stdout since no logger exists yet.
    pub fn from_env(var: &str) -> Self {
        let expression = env::var(var).unwrap_or_default();
        let mut spec = Self::default();
        for entry in split_entries(&expression) {
            match parse_entry(entry) {
                Ok((module, level)) => spec.insert(module, level),
                Err(err) => println!("Ignoring {err} from {var}"),
            }
        }
        spec
    }

    pub fn root_level(&self) -> LevelFilter {
        self.root.unwrap_or(Self::DEFAULT_ROOT_LEVEL)
    }

    pub fn module_level(&self, module: &str) -> Option<LevelFilter> {
        self.modules.get(module).copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (String, LevelFilter)> + '_ {
        self.modules.iter().map(|(name, level)| (name.clone(), *level))
    }

    /// Entries of `other` override entries of `self`.
    pub fn merge(&mut self, other: FilterSpec) {
        if other.root.is_some() {
            self.root = other.root;
        }
        self.modules.extend(other.modules);
    }

    fn insert(&mut self, module: Option<&str>, level: LevelFilter) {
        match module {
            Some(module) => {
                self.modules.insert(module.to_owned(), level);
            }
            None => self.root = Some(level),
        }
    }
}

impl FromStr for FilterSpec {
    type Err = LogError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let mut spec = Self::default();
        for entry in split_entries(expression) {
            let (module, level) = parse_entry(entry)?;
            spec.insert(module, level);
        }
        Ok(spec)
    }
}

fn split_entries(expression: &str) -> impl Iterator<Item = &str> {
    expression.split(',').map(str::trim).filter(|x| !x.is_empty())
}

fn parse_entry(entry: &str) -> Result<(Option<&str>, LevelFilter), LogError> {
    let invalid = || LogError::ParseFilterSpec(entry.to_owned());
    match entry.split_once('=') {
        None => match entry.parse::<LevelFilter>() {
            Ok(level) => Ok((None, level)),
            Err(_) => Ok((Some(entry), LevelFilter::max())),
        },
        Some((module, level)) => {
            let module = module.trim();
            if module.is_empty() || level.contains('=') {
                return Err(invalid());
            }
            let level = level.trim();
            if level.is_empty() {
                return Ok((Some(module), LevelFilter::max()));
            }
            level.parse::<LevelFilter>().map(|level| (Some(module), level)).map_err(|_| invalid())
        }
    }
}
