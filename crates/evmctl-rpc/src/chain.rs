use tracing::debug;

/// An empty block: the dev node has no transactions, only height and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
struct ChainState {
    blocks: Vec<Block>,
    /// Seconds added to the wall clock by `evm_increaseTime`.
    time_offset: u64,
}

/// In-memory chain driven by the control methods.
///
/// Snapshot ids start at 1. Reverting to a snapshot consumes it together with
/// every snapshot taken after it.
#[derive(Debug)]
pub struct DevChain {
    state: ChainState,
    snapshots: Vec<(u64, ChainState)>,
    next_snapshot: u64,
}

impl DevChain {
    pub fn new(genesis_timestamp: u64) -> Self {
        Self {
            state: ChainState {
                blocks: vec![Block {
                    number: 0,
                    timestamp: genesis_timestamp,
                }],
                time_offset: 0,
            },
            snapshots: Vec::new(),
            next_snapshot: 1,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.latest().number
    }

    pub fn latest(&self) -> &Block {
        // Genesis is never removed, not even by a revert.
        &self.state.blocks[self.state.blocks.len() - 1]
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        self.state.blocks.get(number as usize)
    }

    pub fn time_offset(&self) -> u64 {
        self.state.time_offset
    }

    /// Append a block stamped `now + offset`, never earlier than its parent.
    /// The timestamp saturates at `u64::MAX`.
    pub fn mine(&mut self, now: u64) -> &Block {
        let parent = self.latest();
        let block = Block {
            number: parent.number + 1,
            timestamp: now.saturating_add(self.state.time_offset).max(parent.timestamp),
        };
        debug!(number = block.number, timestamp = block.timestamp, "block mined");
        self.state.blocks.push(block);
        self.latest()
    }

    /// Returns the new cumulative offset, or `None` (offset unchanged) when it
    /// would overflow.
    pub fn increase_time(&mut self, seconds: u64) -> Option<u64> {
        let offset = self.state.time_offset.checked_add(seconds)?;
        self.state.time_offset = offset;
        Some(offset)
    }

    pub fn snapshot(&mut self) -> u64 {
        let id = self.next_snapshot;
        self.next_snapshot += 1;
        self.snapshots.push((id, self.state.clone()));
        debug!(id, height = self.block_number(), "snapshot taken");
        id
    }

    pub fn revert(&mut self, id: u64) -> bool {
        let Some(pos) = self.snapshots.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        let (_, state) = self.snapshots.swap_remove(pos);
        self.snapshots.truncate(pos);
        self.state = state;
        debug!(id, height = self.block_number(), "reverted to snapshot");
        true
    }
}
