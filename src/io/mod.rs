//! Format-specific reading and writing.
//!
//! - `csr` - Compressed Sparse Row binary format for the weight matrix and its grid index
//! - `csv` - CSV output of annual county tables

pub(crate) mod csr;
pub(crate) mod csv;
