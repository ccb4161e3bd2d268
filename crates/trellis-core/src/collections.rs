use crate::descriptor::Key;

#[cfg(feature = "std-hash")]
pub(crate) mod map {
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub(crate) mod map {
    pub use rustc_hash::FxHashMap as HashMap;
}

/// Lookup from a child key to its position in the next child sequence.
pub(crate) type KeyIndex = map::HashMap<Key, usize>;
