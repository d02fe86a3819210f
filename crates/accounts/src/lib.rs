pub mod config;
pub mod credentials;
pub mod error;
pub mod response;
pub mod server;
pub mod uploads;
pub mod user;

pub use config::{AccountsConfig, ConfigError, ConfigLoader};
pub use credentials::{Claims, PasswordHasher, TokenIssuer};
pub use error::{AccountError, ApiError, Result, StoreError};
pub use response::Envelope;
pub use server::{build_state, start_server};
pub use uploads::{UploadStore, UploadedFile};
pub use user::{
    AccountService, AccountState, InMemoryUserRepository, PostgresUserRepository, User,
    UserRepository, UserResponse,
};
