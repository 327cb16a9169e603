pub mod holding_store;
pub mod price_service;
pub mod refresh_scheduler;
pub mod tracker_worker;
pub mod valuation_service;
