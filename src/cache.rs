//! Set-associative cache model: configurable geometry and LRU replacement.

use log::debug;

use crate::error::Error;

/// Result of a single cache reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
}

/// Outcome of one reference: hit or miss, plus whether a valid line was
/// overwritten to make room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessOutcome {
    pub result: AccessResult,
    pub evicted: bool,
}

/// Cache geometry in the classic `(s, E, b)` parameterization.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Number of set-index bits (`S = 2^s` is the number of sets).
    pub set_bits: u32,
    /// Associativity (number of lines per set).
    pub associativity: usize,
    /// Number of block-offset bits (`B = 2^b` is the block size).
    pub block_bits: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            set_bits: 5,
            associativity: 2,
            block_bits: 6,
        }
    }
}

impl CacheConfig {
    /// Number of sets (`2^s`).
    pub fn num_sets(&self) -> usize {
        1 << self.set_bits
    }

    fn validate(&self) -> Result<(), Error> {
        if self.associativity < 1 {
            return Err(Error::Config("associativity must be at least 1".to_string()));
        }
        if self.set_bits >= u64::BITS {
            return Err(Error::Config(format!(
                "set-index bits must be below {}, got {}",
                u64::BITS,
                self.set_bits
            )));
        }
        Ok(())
    }
}

/// One storage slot: valid flag, tag, and last-reference timestamp.
/// Never-referenced lines keep `recency = 0`.
#[derive(Clone, Debug)]
struct CacheLine {
    valid: bool,
    tag: u64,
    recency: u64,
}

/// One set: a fixed group of `E` lines whose index positions are stable.
struct CacheSet {
    lines: Vec<CacheLine>,
}

impl CacheSet {
    fn new(associativity: usize) -> Self {
        let lines = (0..associativity)
            .map(|_| CacheLine {
                valid: false,
                tag: 0,
                recency: 0,
            })
            .collect();
        Self { lines }
    }

    /// Index of the line holding `tag`, if present.
    fn find(&self, tag: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.valid && line.tag == tag)
    }

    /// LRU victim: minimum `recency` over the set, scanned in index order
    /// with `<=` so the last line among equals wins. An untouched set
    /// therefore fills from the highest index down.
    fn victim(&self, ceiling: u64) -> usize {
        let mut victim = 0;
        let mut min_recency = ceiling;
        for (i, line) in self.lines.iter().enumerate() {
            if line.recency <= min_recency {
                min_recency = line.recency;
                victim = i;
            }
        }
        victim
    }
}

/// Set-associative cache. Owns its sets and the global reference counter
/// that provides the total order for LRU decisions.
pub struct Cache {
    config: CacheConfig,
    sets: Vec<CacheSet>,
    /// Logical clock: one tick per simulated reference, shared by all sets.
    op_count: u64,
}

impl Cache {
    /// Allocates `2^s` sets of `E` invalid lines. The shape is frozen from
    /// here on; only line contents and the counter mutate.
    pub fn new(config: CacheConfig) -> Result<Self, Error> {
        config.validate()?;
        let sets = (0..config.num_sets())
            .map(|_| CacheSet::new(config.associativity))
            .collect();
        debug!(
            "cache: {} sets x {} ways, {} block-offset bits",
            config.num_sets(),
            config.associativity,
            config.block_bits
        );
        Ok(Self {
            config,
            sets,
            op_count: 0,
        })
    }

    /// Performs one reference against `set_index` with the given `tag`.
    ///
    /// On a hit the matching line's recency is refreshed. On a miss the LRU
    /// line is filled; if it previously held a valid block the fill counts
    /// as an eviction. Every call advances the reference counter by exactly
    /// one and mutates exactly one line.
    pub fn access(&mut self, tag: u64, set_index: usize) -> AccessOutcome {
        let set = &mut self.sets[set_index];
        if let Some(way) = set.find(tag) {
            self.op_count += 1;
            set.lines[way].recency = self.op_count;
            return AccessOutcome {
                result: AccessResult::Hit,
                evicted: false,
            };
        }
        let way = set.victim(self.op_count);
        let line = &mut set.lines[way];
        let evicted = line.valid;
        line.valid = true;
        line.tag = tag;
        self.op_count += 1;
        line.recency = self.op_count;
        AccessOutcome {
            result: AccessResult::Miss,
            evicted,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }
}
