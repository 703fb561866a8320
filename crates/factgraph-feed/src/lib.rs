pub mod enrich;
pub mod load;
