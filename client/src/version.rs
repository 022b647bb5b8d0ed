/// The distributor of this Rollbook client.
///
/// Common values include `campus`, `rollbook` and `dev`.
pub const ROLLBOOK_DISTRIBUTOR: &str = if let Some(distro) = option_env!("ROLLBOOK_DISTRIBUTOR") {
    distro
} else {
    "unknown"
};
