pub mod error_tracking;
