//! Frame assets: catalog listing, image loading and caching.

mod asset;
mod cache;
mod loader;
mod shelf;
mod source;

pub use asset::{AssetImage, FrameAsset};
pub use cache::AssetCache;
pub use loader::{AssetError, AssetLoader};
pub use shelf::{AssetShelf, AssetState};
pub use source::{Catalog, CatalogError, CatalogSource, FileCatalog, HttpCatalog};
