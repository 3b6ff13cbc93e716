//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, Clock, IssuedToken, SystemClock, TokenCodec};
pub use middleware::{
    extract_token, request_gate_middleware, AuthContext, GateOutcome, RequestGate,
};
pub use password::PasswordHasher;
