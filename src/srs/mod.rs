//! Spaced-repetition views. Scheduling itself happens on the backend; this
//! module only groups and labels what it reports.

pub mod dashboard;
pub mod quality;

pub use dashboard::{Dashboard, DashboardStats, StatusFilter, days_until, filter_records};
pub use quality::{WordProgressRow, estimate_quality, quality_label, word_progress};
