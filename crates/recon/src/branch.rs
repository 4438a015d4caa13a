//! Branch code canonicalization.
//!
//! One `BranchTable` is built from the config at startup and passed to every
//! component that compares branch codes or groups by them.

use std::collections::{BTreeMap, HashMap};

use crate::config::ReconConfig;

#[derive(Debug, Clone, Default)]
pub struct BranchTable {
    /// Historical code -> current code.
    aliases: HashMap<String, String>,
    /// Current code -> group representative.
    groups: HashMap<String, String>,
    /// Configured codes, declaration order.
    universe: Vec<String>,
    names: HashMap<String, String>,
    group_names: HashMap<String, String>,
    /// Name alias -> code, for the resolver's name dictionary.
    name_aliases: BTreeMap<String, String>,
}

impl BranchTable {
    /// Every code and name is stored trimmed, so lookups on trimmed input
    /// line up with them.
    pub fn from_config(config: &ReconConfig) -> Self {
        let aliases: HashMap<String, String> = config
            .code_aliases
            .iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let mut groups = HashMap::new();
        let mut group_names = HashMap::new();
        for group in &config.groups {
            let code = group.code.trim();
            for member in &group.members {
                let member = member.trim();
                let current = aliases.get(member).map(String::as_str).unwrap_or(member);
                groups.insert(current.to_string(), code.to_string());
            }
            // The representative maps to itself so canonical codes are fixed points.
            groups.insert(code.to_string(), code.to_string());
            group_names.insert(code.to_string(), group.name.trim().to_string());
        }

        Self {
            aliases,
            groups,
            universe: config.branch_codes(),
            names: config
                .branches
                .iter()
                .map(|b| (b.code.trim().to_string(), b.name.trim().to_string()))
                .collect(),
            group_names,
            name_aliases: config
                .name_aliases
                .iter()
                .map(|(name, code)| (name.trim().to_string(), code.trim().to_string()))
                .collect(),
        }
    }

    /// Canonical form of a raw branch code.
    ///
    /// Unknown codes pass through unchanged (trimmed).
    pub fn canonicalize(&self, raw: &str, grouping: bool) -> String {
        let raw = raw.trim();
        let current = self.aliases.get(raw).map(String::as_str).unwrap_or(raw);
        if grouping {
            if let Some(rep) = self.groups.get(current) {
                return rep.clone();
            }
        }
        current.to_string()
    }

    /// Configured branches in canonical form, de-duplicated, first-seen order.
    pub fn canonical_universe(&self, grouping: bool) -> Vec<String> {
        self.canonicalize_all(&self.universe, grouping)
    }

    /// Canonicalize a list of codes, de-duplicating in first-seen order.
    pub fn canonicalize_all(&self, codes: &[String], grouping: bool) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            let canonical = self.canonicalize(code, grouping);
            if !out.contains(&canonical) {
                out.push(canonical);
            }
        }
        out
    }

    /// Branch name, group name, or the code itself.
    pub fn display_name(&self, code: &str) -> String {
        self.names
            .get(code)
            .or_else(|| self.group_names.get(code))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Official branch names paired with their codes, declaration order.
    pub fn named_branches(&self) -> impl Iterator<Item = (&str, &str)> {
        self.universe.iter().filter_map(|code| {
            self.names
                .get(code)
                .map(|name| (name.as_str(), code.as_str()))
        })
    }

    pub fn name_aliases(&self) -> &BTreeMap<String, String> {
        &self.name_aliases
    }
}
