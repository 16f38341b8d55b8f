pub mod catalog;
pub mod scope;
