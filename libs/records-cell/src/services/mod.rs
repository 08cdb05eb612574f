pub mod invoice;
pub mod records;

pub use invoice::InvoiceService;
pub use records::RecordService;
