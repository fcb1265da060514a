//! Input/output: logging setup, basis set loading, and the restart tensor
//! store used by the Cholesky and FCI drivers.

mod basis_loader;
mod output;
mod tensor_store;

pub use basis_loader::fetch_basis;
pub use output::setup_output;
pub use tensor_store::{
    read_count_file, read_from_disk, write_count_file, write_to_disk, StoredTensor,
};
