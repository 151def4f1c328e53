//! Fixtures shared by the unit tests of every module.

mod fixtures;

pub(crate) use fixtures::*;
