mod credentials;
mod session;

pub use credentials::CredentialStore;
pub use session::AuthSession;
