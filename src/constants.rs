//! Application-wide constants

/// Default number of rows per list page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound for the `limit` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Number of recently reported complaints shown on a user's detail view.
pub const RECENT_COMPLAINTS_PER_USER: u64 = 5;

/// Number of newest accounts listed in user statistics.
pub const RECENT_USERS_IN_STATS: u64 = 10;

/// Minimum HS256 secret length accepted for bearer tokens.
pub const MIN_TOKEN_SECRET_LENGTH: usize = 32;
