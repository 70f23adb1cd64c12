pub mod control;
pub mod unit;

pub use control::SupervisorCtl;
pub use unit::UnitWriter;
