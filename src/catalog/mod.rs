//! Return codes sent back to devices.
//!
//! Codes are grouped by protocol step: `1xxx` registration, `2xxx` check-in,
//! `3xxx` data reception. The registry only deals in [`Outcome`]s; turning one into
//! a wire triple happens here, once the catalog has been loaded at startup.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

const BUNDLED: &str = include_str!("../../return_codes.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    RequestOk,
    RegisterOk,
    MissingInformation,
    BadJson,
    BadDeviceMac,
    AlreadyRegistered,
    CheckinOk,
    BadKey,
    MalformedCheckin,
}

impl Outcome {
    pub const ALL: [Outcome; 9] = [
        Outcome::RequestOk,
        Outcome::RegisterOk,
        Outcome::MissingInformation,
        Outcome::BadJson,
        Outcome::BadDeviceMac,
        Outcome::AlreadyRegistered,
        Outcome::CheckinOk,
        Outcome::BadKey,
        Outcome::MalformedCheckin,
    ];

    /// Symbolic name used as `code_string` on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::RequestOk => "RequestOK",
            Outcome::RegisterOk => "RegisterOK",
            Outcome::MissingInformation => "MissingInformation",
            Outcome::BadJson => "BadJSON",
            Outcome::BadDeviceMac => "BadDeviceMac",
            Outcome::AlreadyRegistered => "AlreadyRegistered",
            Outcome::CheckinOk => "CheckinOK",
            Outcome::BadKey => "BadKey",
            Outcome::MalformedCheckin => "MalformedCheckin",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCode {
    pub code: i64,
    pub code_string: String,
    pub comment: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("return codes are not a valid JSON list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("return code '{0}' is defined more than once")]
    Duplicate(String),
    #[error("return code '{0}' is required but not defined")]
    Missing(&'static str),
}

#[derive(Debug)]
pub struct ReturnCodeCatalog {
    codes: HashMap<String, ReturnCode>,
    // Indexed by `Outcome as usize`, filled only after every outcome resolved.
    outcomes: Vec<ReturnCode>,
}

impl ReturnCodeCatalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let list: Vec<ReturnCode> = serde_json::from_str(text)?;
        let mut codes = HashMap::with_capacity(list.len());
        for entry in list {
            if codes.contains_key(&entry.code_string) {
                return Err(CatalogError::Duplicate(entry.code_string));
            }
            codes.insert(entry.code_string.clone(), entry);
        }
        let outcomes = Outcome::ALL
            .iter()
            .map(|outcome| {
                codes
                    .get(outcome.name())
                    .cloned()
                    .ok_or(CatalogError::Missing(outcome.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { codes, outcomes })
    }

    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED)
    }

    /// Loads the catalog at `path`, or the one shipped with the binary when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Self::bundled().context("Failed to load bundled return codes");
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read return codes from {path:?}"))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to load return codes from {path:?}"))
    }

    pub fn get(&self, outcome: Outcome) -> &ReturnCode {
        &self.outcomes[outcome as usize]
    }

    #[allow(unused)]
    pub fn lookup(&self, code_string: &str) -> Option<&ReturnCode> {
        self.codes.get(code_string)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}
