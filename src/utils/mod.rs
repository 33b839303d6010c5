pub mod calendar;
pub mod format;
pub mod view_cache;
