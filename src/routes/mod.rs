/// Router Module Index
///
/// Splits the API by access level so each group gets its guard as a single layer
/// in `create_router` instead of per-handler wiring.

/// Routes open to anonymous clients (auth gateway and read-only content).
pub mod public;

/// Routes behind the `AuthUser` middleware. Any role with a live session.
pub mod authenticated;

/// Routes nested under `/admin`, behind the admin middleware.
pub mod admin;
