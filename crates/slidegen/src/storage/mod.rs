pub mod artifacts;

pub use artifacts::ArtifactStorage;
