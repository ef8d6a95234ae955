//! Route modules, one router per resource.

pub mod baking;
pub mod credentials;
pub mod status_lists;
