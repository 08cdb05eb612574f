pub mod repositories;
pub mod supabase;

pub use repositories::{
    BookingRepository, ClientRecordRepository, InvoiceSettingsRepository, ReviewRepository, ServiceRateRepository,
    SlotRepository, UserRepository,
};
pub use supabase::SupabaseClient;
