mod datetime;
mod filesystem;
mod string;

pub use datetime::{excel_serial_to_string, utc_timestamp};
pub use filesystem::{copy_into_dir, write_error_to_log};
pub use string::{
    collapse_whitespace, sanitize_file_name, simplify_company_name, strip_phrases, toc_title,
};
