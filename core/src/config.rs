//! The configuration switches enumerated in §6. Constructed explicitly by
//! the embedder — parsing these from a file or CLI is out of scope.

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub skip_minor_difficulty_check: bool,
    pub skip_minor_coinbase_check: bool,
    pub skip_root_difficulty_check: bool,
    /// Minimum number of minor blocks each shard must contribute to a root
    /// block (proof of progress). Must be positive.
    pub proof_of_progress_blocks: u32,
}

impl LedgerConfig {
    pub fn new(
        skip_minor_difficulty_check: bool,
        skip_minor_coinbase_check: bool,
        skip_root_difficulty_check: bool,
        proof_of_progress_blocks: u32,
    ) -> Self {
        assert!(proof_of_progress_blocks > 0, "proof_of_progress_blocks must be positive");
        LedgerConfig {
            skip_minor_difficulty_check,
            skip_minor_coinbase_check,
            skip_root_difficulty_check,
            proof_of_progress_blocks,
        }
    }
}

impl Default for LedgerConfig {
    /// Testnet-permissive defaults: difficulty/coinbase-value algorithms are
    /// out of scope (§9 open question 2), so the skip flags default to
    /// `true` and the gates simply pass, matching how the teacher's own
    /// test suite always sets `SKIP_*_CHECK` rather than exercising the
    /// unimplemented algorithms.
    fn default() -> Self {
        LedgerConfig {
            skip_minor_difficulty_check: true,
            skip_minor_coinbase_check: true,
            skip_root_difficulty_check: true,
            proof_of_progress_blocks: 1,
        }
    }
}
