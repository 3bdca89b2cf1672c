pub mod analyze;
pub mod batch;
pub mod compile;
pub mod dispatch;
pub mod instrument;
pub mod lint;
pub mod shared;
