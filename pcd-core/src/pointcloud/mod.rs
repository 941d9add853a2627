pub mod decimation;
pub mod merge;
pub mod point;
