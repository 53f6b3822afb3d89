use std::fmt::{Debug, Display};

macro_rules! define_index {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline(always)]
            pub fn new(id: usize) -> Self {
                Self(id as u32)
            }
            #[inline(always)]
            pub fn index(&self) -> usize {
                self.0 as usize
            }

            /// Every id below `count`, in index order.
            pub fn range(count: usize) -> impl Iterator<Item = Self> + use<> {
                (0..count).map(Self::new)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_index!(
    /// A hard router of the NoC topology.
    NocRouterId
);
define_index!(
    /// A directed link between two routers.
    NocLinkId
);
define_index!(TrafficFlowId);
define_index!(
    /// A placeable block. Logical NoC router blocks and ordinary logic
    /// blocks share this id space.
    ClusterBlockId
);
