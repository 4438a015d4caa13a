//! Counterparty resolution for clearing-account rows.
//!
//! Strategies are tried in order; the first one that names a branch wins.

use std::collections::HashMap;

use crate::branch::BranchTable;

pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw (not yet canonical) counterparty code, if this strategy knows it.
    fn resolve(&self, sub_ledger_code: &str, sub_ledger_name: &str) -> Option<String>;
}

/// Authoritative lookup in the configured sub-ledger code map.
#[derive(Debug, Clone, Default)]
pub struct SubLedgerCodeLookup {
    map: HashMap<String, String>,
}

impl SubLedgerCodeLookup {
    /// Built from `ReconConfig::sub_ledger_branches`.
    pub fn new(sub_ledger_branches: &[(String, String)]) -> Self {
        Self { map: sub_ledger_branches.iter().cloned().collect() }
    }
}

impl ResolveStrategy for SubLedgerCodeLookup {
    fn name(&self) -> &'static str {
        "sub_ledger_code"
    }

    fn resolve(&self, sub_ledger_code: &str, _sub_ledger_name: &str) -> Option<String> {
        self.map.get(sub_ledger_code.trim()).cloned()
    }
}

/// Longest-prefix match of the sub-ledger name against known branch names.
#[derive(Debug, Clone, Default)]
pub struct NamePrefixMatch {
    /// (name, code), longest name first.
    dictionary: Vec<(String, String)>,
}

impl NamePrefixMatch {
    pub fn new(table: &BranchTable) -> Self {
        let mut dictionary: Vec<(String, String)> = Vec::new();
        for (name, code) in table.name_aliases() {
            if !name.is_empty() {
                dictionary.push((name.clone(), code.clone()));
            }
        }
        for (name, code) in table.named_branches() {
            if !name.is_empty() && !dictionary.iter().any(|(n, _)| n == name) {
                dictionary.push((name.to_string(), code.to_string()));
            }
        }
        // Stable: equal lengths keep aliases ahead of official names.
        dictionary.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { dictionary }
    }
}

impl ResolveStrategy for NamePrefixMatch {
    fn name(&self) -> &'static str {
        "name_prefix"
    }

    fn resolve(&self, _sub_ledger_code: &str, sub_ledger_name: &str) -> Option<String> {
        let name = sub_ledger_name.trim();
        if name.is_empty() {
            return None;
        }
        self.dictionary
            .iter()
            .find(|(candidate, _)| name.starts_with(candidate.as_str()))
            .map(|(_, code)| code.clone())
    }
}

/// Outcome of resolving a row against its owning branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Canonical counterparty code.
    Resolved(String),
    Unresolved,
    SelfReferencing,
}

pub struct CounterpartyResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl CounterpartyResolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Sub-ledger code map first, then the name dictionary.
    pub fn standard(sub_ledger_branches: &[(String, String)], table: &BranchTable) -> Self {
        Self::new(vec![
            Box::new(SubLedgerCodeLookup::new(sub_ledger_branches)),
            Box::new(NamePrefixMatch::new(table)),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Raw counterparty code for a row, before canonicalization.
    pub fn resolve(&self, sub_ledger_code: &str, sub_ledger_name: &str) -> Option<String> {
        self.strategies
            .iter()
            .find_map(|s| s.resolve(sub_ledger_code, sub_ledger_name))
    }

    /// Resolve and canonicalize, flagging rows that point back at their owner.
    pub fn classify(
        &self,
        table: &BranchTable,
        owner: &str,
        sub_ledger_code: &str,
        sub_ledger_name: &str,
        grouping: bool,
    ) -> Resolution {
        let Some(raw) = self.resolve(sub_ledger_code, sub_ledger_name) else {
            return Resolution::Unresolved;
        };
        let counterparty = table.canonicalize(&raw, grouping);
        if counterparty == table.canonicalize(owner, grouping) {
            Resolution::SelfReferencing
        } else {
            Resolution::Resolved(counterparty)
        }
    }
}
