pub mod email;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod ticket_code;

pub use email::validate_email;
pub use jwt::*;
pub use pagination::*;
pub use password::*;
pub use ticket_code::{generate_order_number, generate_ticket_code, generate_unique_ticket_code};
