//! Third-party API clients and response normalizers.
//!
//! Each vendor module wraps a [`http::VendorClient`] and maps vendor JSON
//! onto the stable shapes in `reach-core`. All failures surface as
//! [`ProviderError`], which knows its HTTP status and end-user help text.

pub mod ayrshare;
pub mod error;
pub mod http;
pub mod identity;
pub mod modash;
pub mod normalize;
pub mod registry;
pub mod tiktok;

pub use ayrshare::AyrshareClient;
pub use error::ProviderError;
pub use http::{Provider, VendorClient};
pub use identity::{AuthUser, IdentityClient};
pub use modash::ModashClient;
pub use normalize::{FieldAliases, ProfileAdapter};
pub use registry::ProviderSet;
pub use tiktok::TikTokClient;
