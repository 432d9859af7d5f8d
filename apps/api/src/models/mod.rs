pub mod analysis;
pub mod resume;
pub mod sections;
