//! 逻辑网内部索引：库所、弧与迁移在 `IndexVec` 中的位置。
//!
//! 编辑器侧的元素标识（字符串 id）只在组装与报告边界出现，
//! 运行时一律使用这里定义的紧凑索引。
use std::fmt;

use crate::net::index_vec::Idx;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl Idx for $name {
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_usize(idx: usize) -> Self {
                Self(idx as u32)
            }
        }
    };
}

define_id!(PlaceId, "p#");
define_id!(ArcId, "a#");
define_id!(TransitionId, "t#");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_uses_prefix() {
        assert_eq!(format!("{:?}", PlaceId::new(3)), "p#3");
        assert_eq!(format!("{:?}", TransitionId::from_usize(7)), "t#7");
        assert_eq!(ArcId::new(2).index(), 2);
    }
}
