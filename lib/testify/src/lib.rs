pub mod netflow;
pub mod random;
pub mod temp;

// re-export
pub use random::random_string;
pub use temp::temp_file;
