pub mod escape;
pub mod ids;
pub mod places;
pub mod registry;
pub mod sanitize;
pub mod script;
pub mod uploads;
pub mod validate;
