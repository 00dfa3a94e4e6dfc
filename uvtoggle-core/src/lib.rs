//! uvtoggle library exports

pub mod github;
pub mod pyproject;
pub mod pypi;
pub mod source;
pub mod sync;
