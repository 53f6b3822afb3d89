pub mod indices;
pub mod noc;
pub mod placement;
pub mod traffic;
