pub mod adjustments;
pub mod bounds;
pub mod composite;
pub mod filters;
pub mod fit;
pub mod resample;
pub mod stage;
