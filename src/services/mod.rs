pub mod scope;

pub use scope::{strip_markup, ScopeService};
