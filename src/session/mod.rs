//! Session lifecycle for the platform client: durable token/profile slots and the
//! role derived from the cached profile. Implementation is split across sub-modules.

mod role;
mod storage;
mod store;

pub use role::{role_tag_of, Role, CUSTOMER_TAG, PROVIDER_TAG};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{Session, SessionStore, SessionUpdate, UserProfile, ACCESS_KEY, REFRESH_KEY, USER_KEY};
pub(crate) use store::id_of;
