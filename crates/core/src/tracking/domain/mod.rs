pub mod association;
pub mod linear_assignment;
pub mod outlet;
pub mod registry_config;
pub mod track_registry;
pub mod tracked_object;
