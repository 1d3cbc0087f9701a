pub mod gallery;
pub mod interpret;
