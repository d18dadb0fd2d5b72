pub mod json_validated;
pub mod source_addr;
