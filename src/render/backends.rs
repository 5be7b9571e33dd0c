/// Null render port, for tests and hosts without a renderer.
pub mod null;
/// Tile-map render port.
pub mod tiles;
