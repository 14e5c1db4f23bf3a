//! Calendar exceptions for known archive defects.
//!
//! Loaded from a versioned YAML list. The default list is compiled in from
//! `config/calendar_exceptions.yaml` and can be replaced at run time.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reanalysis_common::Variable;

use crate::cycle::{CycleFile, FileStream};

const DEFAULT_EXCEPTIONS: &str = include_str!("../config/calendar_exceptions.yaml");

/// Highest list version this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// File family an exception applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionStream {
    Regional,
    SurfaceExchange,
}

impl ExceptionStream {
    fn matches(&self, stream: FileStream) -> bool {
        matches!(
            (self, stream),
            (ExceptionStream::Regional, FileStream::Primary)
                | (ExceptionStream::SurfaceExchange, FileStream::SurfaceExchange)
        )
    }
}

/// How an excluded file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
    /// Do not open the file; the sample is left out.
    Skip,
    /// Do not open the file; its sample is replaced by 0.0.
    ZeroFill,
}

/// One entry of the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    pub stream: ExceptionStream,
    #[serde(default)]
    pub accumulated_only: bool,
    /// Cycle date.
    pub date: NaiveDate,
    /// Restrict to one cycle of `date`; all cycles when absent.
    #[serde(default)]
    pub cycle_hour: Option<u32>,
    pub policy: ExceptionPolicy,
    #[serde(default)]
    pub note: String,
}

impl CalendarException {
    pub fn matches(&self, file: &CycleFile, variable: &Variable) -> bool {
        if !self.stream.matches(file.stream) {
            return false;
        }
        if self.accumulated_only && !variable.is_accumulated() {
            return false;
        }
        if file.cycle.date != self.date {
            return false;
        }
        self.cycle_hour
            .map_or(true, |hour| hour == file.cycle.cycle.hour())
    }
}

/// The full exception list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionList {
    pub version: u32,
    #[serde(default)]
    pub exceptions: Vec<CalendarException>,
}

impl ExceptionList {
    /// The list compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_EXCEPTIONS).context("Failed to parse embedded calendar exceptions")
    }

    /// An empty list, for archives without known defects.
    pub fn empty() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            exceptions: Vec::new(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let list: ExceptionList = serde_yaml::from_str(yaml)?;
        if list.version > SUPPORTED_VERSION {
            bail!(
                "calendar exception list version {} is newer than supported version {}",
                list.version,
                SUPPORTED_VERSION
            );
        }
        for exception in &list.exceptions {
            if let Some(hour) = exception.cycle_hour {
                if hour % 6 != 0 || hour > 18 {
                    bail!("cycle_hour {} on {} is not a cycle start", hour, exception.date);
                }
            }
        }
        Ok(list)
    }

    /// Load a list from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let list = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(
            path = %path.display(),
            version = list.version,
            count = list.exceptions.len(),
            "Loaded calendar exceptions"
        );
        Ok(list)
    }

    /// Policy for `file` when extracting `variable`, `None` if it is read normally.
    pub fn lookup(&self, file: &CycleFile, variable: &Variable) -> Option<ExceptionPolicy> {
        let found = self
            .exceptions
            .iter()
            .find(|e| e.matches(file, variable))
            .map(|e| e.policy);
        if let Some(policy) = found {
            debug!(file = %file, policy = ?policy, "Calendar exception applies");
        }
        found
    }
}
