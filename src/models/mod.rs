//! Data models for the office administration dashboard.
//!
//! All wire shapes are camelCase to match the dashboard's JSON contract.

mod assignment;
mod item;
mod office;
mod page;
mod user;

pub use assignment::*;
pub use item::*;
pub use office::*;
pub use page::*;
pub use user::*;
