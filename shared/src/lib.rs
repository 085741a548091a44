pub mod category;
pub mod completion;
pub mod crs;
pub mod deep_link;
pub mod descriptor;
pub mod error;
pub mod layer;
pub mod legend;
pub mod map;
pub mod marker;
pub mod search;
pub mod surface;
pub mod tags;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use category::{Category, Icon};
pub use completion::CompletionStore;
pub use crs::{CoordinateTransform, PixelPoint, PlaneBounds, PlanePoint, WorldGeometry};
pub use deep_link::DeepLink;
pub use descriptor::*;
pub use error::{MapError, Result};
pub use layer::Layer;
pub use legend::{CategorySelection, Legend, LegendAction, LegendChange};
pub use map::{Map, MapView, SearchHit};
pub use marker::{ForcedVisibility, Marker};
pub use search::SearchQuery;
pub use surface::{RenderSurface, ViewDelta};
pub use tags::{COMPLETED_TAG, TagSettings, TagStore};
pub use visibility::{Verdict, VisibilityContext};
