use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;

use crate::error::ReconError;

/// Column-count safety threshold for breakdown columns per side.
pub const DEFAULT_MAX_BREAKDOWN_COLUMNS: usize = 20;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// The shared clearing account every branch books inter-branch claims to.
    pub clearing_account: String,
    #[serde(default = "default_max_breakdown_columns")]
    pub max_breakdown_columns: usize,
    #[serde(default)]
    pub branches: Vec<BranchConfig>,
    /// Historical / renamed code -> current code.
    #[serde(default)]
    pub code_aliases: BTreeMap<String, String>,
    /// Short or legacy branch name -> code, used by the name-prefix resolver.
    #[serde(default)]
    pub name_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub sub_ledgers: Vec<SubLedgerConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

fn default_max_breakdown_columns() -> usize {
    DEFAULT_MAX_BREAKDOWN_COLUMNS
}

// ---------------------------------------------------------------------------
// Master data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BranchConfig {
    pub code: String,
    pub name: String,
}

/// A set of branches reconciled as one unit when grouping is enabled.
///
/// `code` is the representative the members collapse into. It does not need
/// to be a configured branch; an aggregate code like `KOBE_GROUP` is fine.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub code: String,
    pub name: String,
    pub members: Vec<String>,
}

/// One sub-ledger code on the clearing account.
///
/// `branch` is the counterparty the code books against. Codes that do not
/// identify a branch (eliminations, property) leave it unset.
#[derive(Debug, Clone, Deserialize)]
pub struct SubLedgerConfig {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis payload bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_max_days")]
    pub max_days: usize,
}

fn default_max_items() -> usize {
    300
}

fn default_max_days() -> usize {
    62
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_days: default_max_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub ledger: LedgerColumns,
    #[serde(default)]
    pub trial_balance: TrialBalanceColumns,
}

/// Header names in a general-ledger export. Optional columns are only looked
/// up when configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerColumns {
    pub branch_code: String,
    pub account_code: String,
    pub sub_ledger_code: String,
    pub sub_ledger_name: String,
    pub posting_date: String,
    pub debit: String,
    pub credit: String,
    pub debit_tax: Option<String>,
    pub credit_tax: Option<String>,
    pub voucher_no: Option<String>,
    pub description: Option<String>,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            branch_code: "branch_code".into(),
            account_code: "account_code".into(),
            sub_ledger_code: "sub_ledger_code".into(),
            sub_ledger_name: "sub_ledger_name".into(),
            posting_date: "posting_date".into(),
            debit: "debit".into(),
            credit: "credit".into(),
            debit_tax: None,
            credit_tax: None,
            voucher_no: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrialBalanceColumns {
    pub branch_code: String,
    pub account_code: String,
    pub sub_ledger_code: String,
    pub sub_ledger_name: String,
    pub ending_balance: String,
}

impl Default for TrialBalanceColumns {
    fn default() -> Self {
        Self {
            branch_code: "branch_code".into(),
            account_code: "account_code".into(),
            sub_ledger_code: "sub_ledger_code".into(),
            sub_ledger_name: "sub_ledger_name".into(),
            ending_balance: "ending_balance".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Configured branch codes in declaration order, trimmed.
    pub fn branch_codes(&self) -> Vec<String> {
        self.branches.iter().map(|b| b.code.trim().to_string()).collect()
    }

    /// `(sub-ledger code, counterparty)` for every code that names a branch.
    pub fn sub_ledger_branches(&self) -> Vec<(String, String)> {
        self.sub_ledgers
            .iter()
            .filter_map(|s| {
                let branch = s.branch.as_deref()?.trim();
                (!branch.is_empty()).then(|| (s.code.trim().to_string(), branch.to_string()))
            })
            .collect()
    }

    /// Codes are compared trimmed throughout, the same way `BranchTable`
    /// stores them.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.clearing_account.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "clearing_account must not be empty".into(),
            ));
        }

        if self.max_breakdown_columns == 0 {
            return Err(ReconError::ConfigValidation(
                "max_breakdown_columns must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for branch in &self.branches {
            let code = branch.code.trim();
            if code.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "branch '{}' has an empty code",
                    branch.name
                )));
            }
            if !seen.insert(code) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate branch code '{code}'"
                )));
            }
        }

        let mut aliases: BTreeMap<&str, &str> = BTreeMap::new();
        for (from, to) in &self.code_aliases {
            let (from, to) = (from.trim(), to.trim());
            if from.is_empty() || to.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "code alias '{from}' -> '{to}': both codes must be non-empty"
                )));
            }
            if aliases.insert(from, to).is_some() {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate code alias '{from}'"
                )));
            }
        }

        // Aliases resolve in one step, so a target must never be a key itself.
        for (from, to) in &aliases {
            if from == to {
                return Err(ReconError::ConfigValidation(format!(
                    "code alias '{from}' points at itself"
                )));
            }
            if aliases.contains_key(to) {
                return Err(ReconError::ConfigValidation(format!(
                    "code alias '{from}' -> '{to}': target is itself an alias"
                )));
            }
        }

        for (name, code) in &self.name_aliases {
            if name.trim().is_empty() || code.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "name alias '{name}' -> '{code}': name and code must be non-empty"
                )));
            }
        }

        let mut group_codes = HashSet::new();
        // Resolved member -> the group it collapses into.
        let mut grouped: HashMap<&str, &str> = HashMap::new();
        for group in &self.groups {
            let code = group.code.trim();
            if code.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "group '{}' has an empty code",
                    group.name
                )));
            }
            if aliases.contains_key(code) {
                return Err(ReconError::ConfigValidation(format!(
                    "group code '{code}' is also a code alias"
                )));
            }
            if !group_codes.insert(code) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate group code '{code}'"
                )));
            }
            if group.members.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "group '{code}' has no members"
                )));
            }
            for member in &group.members {
                let member = member.trim();
                let resolved = aliases.get(member).copied().unwrap_or(member);
                if resolved.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "group '{code}' has an empty member code"
                    )));
                }
                if grouped.insert(resolved, code).is_some_and(|prev| prev != code) {
                    return Err(ReconError::ConfigValidation(format!(
                        "branch '{resolved}' belongs to more than one group"
                    )));
                }
            }
        }

        // A representative must not be collapsed into some other group.
        for group in &self.groups {
            let code = group.code.trim();
            if grouped.get(code).is_some_and(|owner| *owner != code) {
                return Err(ReconError::ConfigValidation(format!(
                    "group code '{code}' is a member of another group"
                )));
            }
        }

        let mut sub_codes = HashSet::new();
        for sub in &self.sub_ledgers {
            if sub.code.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sub-ledger '{}' has an empty code",
                    sub.name
                )));
            }
            if !sub_codes.insert(sub.code.trim()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate sub-ledger code '{}'",
                    sub.code.trim()
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
