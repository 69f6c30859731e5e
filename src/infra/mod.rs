//! Concrete implementations of the collaborator seams in [`crate::services`].

pub mod postgres;
pub mod s3;
pub mod schiphol;
