pub mod collectors;
pub mod cropper;
pub mod di;
pub mod differ;
pub mod edge;
pub mod fingerprint;
pub mod graph;
pub mod hierarchy;
pub mod index;
pub mod level;
pub mod modification;
pub mod ports;
pub mod snapshot;
pub mod source;
