pub mod hashid;
pub mod jwt;
pub mod password;

pub use hashid::Hashids;
pub use jwt::{decode_jwt, encode_access_token};
pub use password::{hash_password, verify_password};
