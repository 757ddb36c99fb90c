// Repositories module - cart snapshot storage

pub mod cart_repository;


pub use cart_repository::{CartRepository, FileCartRepository, InMemoryCartRepository};
