//! Terminal output.
//!
//! Status lines for the user go to stdout; warnings and fatal errors go to
//! stderr with a distinct prefix so they never blend into progress output.

mod plain;

pub use plain::{
    print_error, print_info, print_scan_header, print_success, print_summary, print_warning,
    server_line,
};
