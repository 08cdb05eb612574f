pub mod planner;
pub mod slot;

pub use slot::SlotService;
