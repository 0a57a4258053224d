//! Statement builder module

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

// Re-export types from submodules
pub use delete::Delete;
pub use insert::Insert;
pub use select::{Cte, JoinType, OrderBy, Select, SortDirection, Union};
pub use update::Update;
