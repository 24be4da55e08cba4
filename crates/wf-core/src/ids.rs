//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Robot and station ids are assigned
//! 0..n in row-major floor order.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Index of a robot in the fleet.
    pub struct RobotId(u32);
}

typed_id! {
    /// Identity of a charging, packing, or loading station.
    pub struct StationId(u32);
}

typed_id! {
    /// Key into the inventory store.
    pub struct ProductId(u32);
}

typed_id! {
    /// Unique identifier of a submitted or internally created task.
    pub struct TaskId(u64);
}
