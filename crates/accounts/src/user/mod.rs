pub mod handlers;
pub mod memory;
pub mod model;
pub mod repository;
pub mod service;

pub use handlers::{configure, AccountState};
pub use memory::InMemoryUserRepository;
pub use model::{
    LoginRequest, SignupForm, UpdateOutcome, UpdateUserRequest, User, UserResponse,
};
pub use repository::{PostgresUserRepository, UserRepository};
pub use service::{AccountService, SignupSubmission};
