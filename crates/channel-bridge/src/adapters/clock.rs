//! Time and block-context sources.

use crate::domain::BlockContext;
use crate::ports::{BlockContextProvider, TimeSource};
use parking_lot::RwLock;
use shared_types::Timestamp;

/// Wall-clock time in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually driven clock for testing.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Set current time.
    pub fn set_time(&self, time: Timestamp) {
        *self.now.write() = time;
    }

    /// Advance time.
    pub fn advance_time(&self, secs: u64) {
        let mut now = self.now.write();
        *now = now.saturating_add(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}

/// Block context that changes only when told to.
#[derive(Debug)]
pub struct FixedBlockContext {
    context: RwLock<BlockContext>,
}

impl FixedBlockContext {
    /// Create provider returning `context`.
    pub fn new(context: BlockContext) -> Self {
        Self {
            context: RwLock::new(context),
        }
    }

    /// Move to a new block.
    pub fn set(&self, context: BlockContext) {
        *self.context.write() = context;
    }
}

impl Default for FixedBlockContext {
    fn default() -> Self {
        Self::new(BlockContext {
            number: 1,
            hash: [0x0B; 32],
            timestamp: 1_700_000_000,
        })
    }
}

impl BlockContextProvider for FixedBlockContext {
    fn current(&self) -> BlockContext {
        *self.context.read()
    }
}
