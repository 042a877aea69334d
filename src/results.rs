//! Query results: nullable text [`Field`]s, [`Row`]s, and the cursor-style [`ResultSet`].

pub mod field;
pub mod result_set;
pub mod row;

pub use field::Field;
pub use result_set::ResultSet;
pub use row::Row;
