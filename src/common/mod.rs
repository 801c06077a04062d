mod fs;
mod hash;

pub(crate) use fs::*;
pub(crate) use hash::*;
