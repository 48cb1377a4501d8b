//! Stable exit codes for the `jiuzhao` CLI.

/// Command finished (a session ending without a verified proof is still OK).
pub const OK: i32 = 0;
/// Invalid config, unusable workspace, or another startup failure.
pub const INVALID: i32 = 1;
