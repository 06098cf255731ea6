pub mod billing_service;
pub mod expense_service;
pub mod segment_service;
pub mod site_service;
pub mod summary_service;

pub use billing_service::BillingService;
pub use expense_service::ExpenseService;
pub use segment_service::SegmentService;
pub use site_service::SiteService;
pub use summary_service::SummaryService;
