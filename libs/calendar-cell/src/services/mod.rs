pub mod agenda;
pub mod google;
pub mod sync;

pub use google::GoogleCalendarClient;
pub use sync::CalendarSyncService;
