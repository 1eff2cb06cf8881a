mod block_union_find;
mod detector_defect;
mod total_f64;

pub use block_union_find::BlockUnionFind;
pub use detector_defect::DetectorDefect;
pub use total_f64::TotalF64;
