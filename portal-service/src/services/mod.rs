//! Services layer: tokens, policy cache, storage backends.

mod database;
pub mod mock;
pub mod policy;
pub mod redis;
pub mod store;
mod token;

pub use database::Database;
pub use mock::{MockAdminStore, MockPolicyStore, MockUserStore};
pub use policy::{normalize_object, PolicyCache, PolicyData, PolicySnapshot, PolicyStore};
pub use redis::{MockBlacklist, RedisService, TokenBlacklist};
pub use store::{AdminStore, UserStore};
pub use token::{AccessTokenClaims, SubjectKind, TokenService};
