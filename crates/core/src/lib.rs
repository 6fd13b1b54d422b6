//! Echo Chat core types and utilities

pub mod credentials;
pub mod error;
pub mod session;
pub mod toast;
pub mod types;

pub use credentials::{CredentialStore, MockCredentialStore};
pub use error::{AuthError, AuthFailure, CoreError, CoreResult};
pub use session::{FileStore, MemoryStore, Session, SessionStore, TOKEN_KEY, USER_INFO_KEY};
pub use toast::{ToastKind, ToastPresenter, ToastRequest, Toaster};
pub use types::{AuthSuccess, NewUser, Plan, UserProfile, UserRecord};
