//! Integration test modules.

mod progress_store_test;
mod ride_simulation_test;
mod sensor_pipeline_test;
