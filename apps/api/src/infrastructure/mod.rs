// Infrastructure layer module
// Contains the file-backed storage adapters

pub mod repositories;
