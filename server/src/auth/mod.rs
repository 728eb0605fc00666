use async_trait::async_trait;

pub mod caller;
pub mod jwt;

pub use caller::Caller;
pub use jwt::JwtIdentityProvider;

/// Stable identifier of the organizer behind a credential.
pub type OrganizerId = String;

/// Turns a bearer credential into an organizer id. `None` means the
/// credential is not acceptable.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credential: &str) -> Option<OrganizerId>;
}
