/// Scan loop behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Also write a record for each master block, after the records of its shard blocks.
    pub record_master_blocks: bool,

    /// Stop after this many master blocks have been processed. Unbounded when `None`.
    pub max_master_blocks: Option<u64>,
}

impl ScanConfig {
    pub fn new(record_master_blocks: bool, max_master_blocks: Option<u64>) -> Self {
        Self { record_master_blocks, max_master_blocks }
    }

    pub fn with_max_master_blocks(mut self, max: u64) -> Self {
        self.max_master_blocks = Some(max);
        self
    }

    pub fn without_master_records(mut self) -> Self {
        self.record_master_blocks = false;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { record_master_blocks: true, max_master_blocks: None }
    }
}
