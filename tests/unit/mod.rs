//! Unit test modules.

mod frame_decoder_test;
mod gpx_export_test;
mod physics_test;
mod route_import_test;
mod smoothing_test;
