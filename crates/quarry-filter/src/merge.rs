use bson::{Bson, Document};

/// Fold `from` into `into`.
///
/// - keys missing from `into` are inserted as-is
/// - documents under the same key are merged recursively
/// - arrays under the same key are concatenated, `into`'s elements first
/// - any other collision is last-write-wins
///
/// This is what concatenates the `$and` groups of different fields into one
/// top-level `$and` array.
pub fn merge(mut into: Document, from: Document) -> Document {
    for (key, incoming) in from {
        match (into.get_mut(&key), incoming) {
            (Some(Bson::Document(existing)), Bson::Document(incoming)) => {
                let current = std::mem::take(existing);
                *existing = merge(current, incoming);
            }
            (Some(Bson::Array(existing)), Bson::Array(incoming)) => {
                existing.extend(incoming);
            }
            (_, incoming) => {
                into.insert(key, incoming);
            }
        }
    }
    into
}
