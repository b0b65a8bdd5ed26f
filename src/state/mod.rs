pub mod crawl_state;
pub mod fingerprint;
pub mod stamp;
