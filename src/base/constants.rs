//! Domain constants shared across the crate.

use std::time::Duration;

/// Folder (under each workspace folder) that holds copybooks.
pub const COPYBOOK_FOLDER_NAME: &str = "COPYBOOKS";

/// File extensions recognized as copybooks, compared case-insensitively.
/// Files without an extension are accepted as well.
pub const COPYBOOK_EXTENSIONS: &[&str] = &["cpy", "copy", "cbl", "cob"];

/// Maximum directory depth searched below a copybook folder.
pub const MAX_COPYBOOK_SEARCH_DEPTH: usize = 100;

/// URI scheme used for copybooks whose provider did not report a location.
pub const COPYBOOK_URI_SCHEME: &str = "copybook:///";

/// How long a resolution task waits for its fetch result.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum copybook nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Granularity at which a waiting task re-checks cancellation.
pub const CANCELLATION_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Fixed format: columns 1-6 hold the sequence number area.
pub const SEQUENCE_AREA_END: usize = 6;

/// Fixed format: column 7 holds the indicator.
pub const INDICATOR_COLUMN: usize = 6;

/// Fixed format: program text ends at column 72.
pub const PROGRAM_TEXT_END: usize = 72;

/// Fixed format: nothing may follow column 80.
pub const MAX_FIXED_LINE_LENGTH: usize = 80;
