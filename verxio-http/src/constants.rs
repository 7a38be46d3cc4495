//! HTTP-specific constants for the Verxio checkout.

/// HTTP header carrying the checkout session id.
///
/// Clients send it to resume a session; the server echoes it on every
/// response, minting a fresh id when the request carried none.
pub const SESSION_HEADER: &str = "x-verxio-session";

/// Default URL of the reflect earn-pool service.
pub const DEFAULT_REFLECT_URL: &str = "https://api.reflect.money/earn";
