//! SeaORM entities for the complaint desk schema.

pub mod apartments;
pub mod buildings;
pub mod comments;
pub mod complaints;
pub mod users;
