pub mod lfu;
pub mod uncached;
