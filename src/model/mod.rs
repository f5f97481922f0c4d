//! Pure data structures shared by the store, the service and the wire protocol.

pub mod product;
pub mod sale;
pub mod user;

pub use product::*;
pub use sale::*;
pub use user::*;
