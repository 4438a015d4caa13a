use crate::branch::BranchTable;
use crate::config::ReconConfig;
use crate::resolver::CounterpartyResolver;

/// Lookup tables and limits shared by every stage of a run.
pub struct ReconContext {
    pub clearing_account: String,
    pub max_breakdown_columns: usize,
    pub table: BranchTable,
    pub resolver: CounterpartyResolver,
    /// (sub-ledger code, raw branch code) for every code tied to a branch.
    pub sub_ledger_branches: Vec<(String, String)>,
}

impl ReconContext {
    pub fn from_config(config: &ReconConfig) -> Self {
        let table = BranchTable::from_config(config);
        let sub_ledger_branches = config.sub_ledger_branches();
        let resolver = CounterpartyResolver::standard(&sub_ledger_branches, &table);
        Self {
            clearing_account: config.clearing_account.trim().to_string(),
            max_breakdown_columns: config.max_breakdown_columns,
            table,
            resolver,
            sub_ledger_branches,
        }
    }

    pub fn is_clearing_account(&self, account_code: &str) -> bool {
        account_code.trim() == self.clearing_account
    }
}
