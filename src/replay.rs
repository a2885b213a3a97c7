//! Trace replay: drives the cache once per implied memory reference.

use std::io::Write;

use crate::address;
use crate::cache::{AccessResult, Cache};
use crate::error::Error;
use crate::stats::Statistics;
use crate::trace::AccessRecord;

/// Replays a record stream against an exclusively owned cache.
pub struct Replayer {
    cache: Cache,
    stats: Statistics,
}

impl Replayer {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            stats: Statistics::new(),
        }
    }

    /// Consumes the record stream and returns the accumulated statistics.
    ///
    /// `Load` and `Store` issue one reference each; `Modify` issues two (a
    /// read then a write of the same block); `Instruction` records are
    /// skipped without touching the cache. With a `verbose` sink, one line
    /// per replayed record is written: the operation letter, the address in
    /// lowercase hex, then `hit` or `miss` (plus `eviction`) per reference
    /// in call order. The first malformed record or sink failure aborts the
    /// replay.
    pub fn run<I>(
        &mut self,
        records: I,
        mut verbose: Option<&mut (dyn Write + '_)>,
    ) -> Result<Statistics, Error>
    where
        I: IntoIterator<Item = Result<AccessRecord, Error>>,
    {
        for record in records {
            let record = record?;
            self.replay_record(record, verbose.as_deref_mut())?;
        }
        Ok(self.stats)
    }

    fn replay_record(
        &mut self,
        record: AccessRecord,
        verbose: Option<&mut (dyn Write + '_)>,
    ) -> Result<(), Error> {
        let references = record.kind.references();
        if references == 0 {
            return Ok(());
        }
        let config = self.cache.config();
        let (tag, set_index) = address::decode(record.address, config.set_bits, config.block_bits);

        let mut line = verbose
            .is_some()
            .then(|| format!("{} {:x}", record.kind, record.address));
        for _ in 0..references {
            let outcome = self.cache.access(tag, set_index);
            self.stats.record(outcome);
            if let Some(line) = line.as_mut() {
                line.push_str(match outcome.result {
                    AccessResult::Hit => " hit",
                    AccessResult::Miss => " miss",
                });
                if outcome.evicted {
                    line.push_str(" eviction");
                }
            }
        }
        if let (Some(sink), Some(line)) = (verbose, line) {
            writeln!(sink, "{}", line)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }
}
