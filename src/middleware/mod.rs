// Request extractors shared by the wiki handlers

pub mod body_extractor;

pub use body_extractor::FormOrJson;
