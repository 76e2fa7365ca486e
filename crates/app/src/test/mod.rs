//! Test support

mod helpers;

pub(crate) use backend::*;
pub(crate) use helpers::*;
