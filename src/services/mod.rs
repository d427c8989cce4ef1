pub mod identity;
pub mod totp;

pub use identity::IdentityClient;
pub use totp::TotpService;
