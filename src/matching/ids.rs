use crate::error::MatchError;
use crate::matching::precondition::check_collection;
use crate::types::Interval;

/// Hands out consecutive ids across the chunks of one collection, so ids stay
/// unique when a run is processed piecewise.
#[derive(Debug, Clone, Default)]
pub struct IdAssigner {
    collection: &'static str,
    seen: i64,
}

impl IdAssigner {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            seen: 0,
        }
    }

    /// Number of ids handed out so far; the next chunk starts here.
    pub fn seen(&self) -> i64 {
        self.seen
    }

    /// Overwrite the ids of `chunk` with the next consecutive block.
    ///
    /// The chunk is validated first; on error no id is changed.
    pub fn assign(&mut self, chunk: &mut [Interval]) -> Result<(), MatchError> {
        check_collection(self.collection, chunk)?;
        for (offset, interval) in chunk.iter_mut().enumerate() {
            interval.id = self.seen + offset as i64;
        }
        self.seen += chunk.len() as i64;
        Ok(())
    }
}
