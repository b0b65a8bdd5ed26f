pub mod console;
pub mod jsonl;
pub mod report_model;
