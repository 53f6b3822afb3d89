pub mod costs;
pub mod moves;
pub mod noc;
