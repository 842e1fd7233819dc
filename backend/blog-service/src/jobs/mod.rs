/// Background jobs
pub mod reconciler;

pub use reconciler::start_reconciler;
