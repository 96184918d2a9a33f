pub mod domain;
pub mod forms;
pub mod ports;

pub use domain::{Feedback, FlashMessage, NewUser, Severity, User, UserCredentials};
pub use forms::{FeedbackInput, FieldErrors, LoginInput, RegisterInput};
pub use ports::{DatabaseService, PortError, PortResult};
