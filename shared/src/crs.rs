use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Pan clamp overscroll, in world-widths on each side.
const MAX_BOUNDS_PADDING: f64 = 0.5;

/// Zoom levels the default initial view sits below the native zoom.
const INITIAL_ZOOM_OFFSET: f64 = 2.0;

/// A point on the rendered tile pyramid, in screen pixels at some zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point on the abstract coordinate plane handed to the tiled renderer.
/// `lng` follows pixel x, `lat` follows pixel y.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanePoint {
    pub lat: f64,
    pub lng: f64,
}

impl PlanePoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Game coordinates as written in descriptors: `[x, y]`.
    pub const fn from_coords(coords: [f64; 2]) -> Self {
        Self {
            lat: coords[1],
            lng: coords[0],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Axis-aligned rectangle on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneBounds {
    pub south_west: PlanePoint,
    pub north_east: PlanePoint,
}

impl PlaneBounds {
    /// Build from any two opposite corners.
    pub fn from_corners(a: PlanePoint, b: PlanePoint) -> Self {
        Self {
            south_west: PlanePoint::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: PlanePoint::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    pub fn width(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }

    pub fn height(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn center(&self) -> PlanePoint {
        PlanePoint::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Grow every side by `ratio` of the matching extent.
    pub fn pad(&self, ratio: f64) -> Self {
        let dlat = self.height() * ratio;
        let dlng = self.width() * ratio;
        Self {
            south_west: PlanePoint::new(self.south_west.lat - dlat, self.south_west.lng - dlng),
            north_east: PlanePoint::new(self.north_east.lat + dlat, self.north_east.lng + dlng),
        }
    }

    pub fn contains(&self, point: PlanePoint) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    pub fn clamp(&self, point: PlanePoint) -> PlanePoint {
        PlanePoint::new(
            point.lat.clamp(self.south_west.lat, self.north_east.lat),
            point.lng.clamp(self.south_west.lng, self.north_east.lng),
        )
    }
}

/// Flat power-of-two transform between pyramid pixels and plane units.
///
/// At zoom `z` one plane unit spans `2^z * tile_size / world_size` pixels:
/// zoom 0 fits the whole world in one tile, and each level up doubles the
/// pixel density. There is deliberately no projection curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    world_size: f64,
    tile_size: f64,
}

impl CoordinateTransform {
    pub fn new(world_size_coords: f64, tile_size_pixels: f64) -> Result<Self> {
        if !(world_size_coords.is_finite() && world_size_coords > 0.0) {
            return Err(MapError::config(
                "coordinate transform",
                format!("world size must be positive, got {world_size_coords}"),
            ));
        }
        if !(tile_size_pixels.is_finite() && tile_size_pixels > 0.0) {
            return Err(MapError::config(
                "coordinate transform",
                format!("tile size must be positive, got {tile_size_pixels}"),
            ));
        }
        Ok(Self {
            world_size: world_size_coords,
            tile_size: tile_size_pixels,
        })
    }

    pub fn world_size(&self) -> f64 {
        self.world_size
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Pyramid scale factor at `zoom`.
    pub fn scale(&self, zoom: f64) -> f64 {
        zoom.exp2()
    }

    /// Inverse of [`Self::scale`].
    pub fn zoom_for_scale(&self, scale: f64) -> f64 {
        scale.log2()
    }

    pub fn pixels_per_unit(&self, zoom: f64) -> f64 {
        self.scale(zoom) * self.tile_size / self.world_size
    }

    pub fn units_per_pixel(&self, zoom: f64) -> f64 {
        self.world_size / (self.scale(zoom) * self.tile_size)
    }

    pub fn pixel_to_plane(&self, pixel: PixelPoint, zoom: f64) -> PlanePoint {
        let k = self.pixels_per_unit(zoom);
        PlanePoint::new(pixel.y / k, pixel.x / k)
    }

    pub fn plane_to_pixel(&self, point: PlanePoint, zoom: f64) -> PixelPoint {
        let k = self.pixels_per_unit(zoom);
        PixelPoint::new(point.lng * k, point.lat * k)
    }
}

/// Everything derived once from the map's size settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldGeometry {
    transform: CoordinateTransform,
    native_zoom: f64,
    max_zoom: f64,
    bounds: PlaneBounds,
    max_bounds: PlaneBounds,
}

impl WorldGeometry {
    pub fn new(
        map_size_pixels: f64,
        map_size_coords: Option<f64>,
        tile_size_pixels: f64,
        max_zoom_override: Option<f64>,
    ) -> Result<Self> {
        if !(map_size_pixels.is_finite() && map_size_pixels > 0.0) {
            return Err(MapError::config(
                "map size",
                format!("must be positive, got {map_size_pixels}"),
            ));
        }
        let transform =
            CoordinateTransform::new(map_size_coords.unwrap_or(map_size_pixels), tile_size_pixels)?;
        let native_zoom = native_zoom(map_size_pixels, tile_size_pixels);
        let max_zoom = match max_zoom_override {
            Some(zoom) if zoom.is_finite() && zoom >= 0.0 => zoom,
            Some(zoom) => {
                return Err(MapError::config(
                    "max zoom",
                    format!("must be a non-negative number, got {zoom}"),
                ));
            }
            None => native_zoom,
        };

        // Corners are projected at the native zoom, even when max zoom is overridden.
        let bounds = PlaneBounds::from_corners(
            transform.pixel_to_plane(PixelPoint::new(0.0, map_size_pixels), native_zoom),
            transform.pixel_to_plane(PixelPoint::new(map_size_pixels, 0.0), native_zoom),
        );

        Ok(Self {
            transform,
            native_zoom,
            max_zoom,
            bounds,
            max_bounds: bounds.pad(MAX_BOUNDS_PADDING),
        })
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn native_zoom(&self) -> f64 {
        self.native_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn bounds(&self) -> PlaneBounds {
        self.bounds
    }

    pub fn max_bounds(&self) -> PlaneBounds {
        self.max_bounds
    }

    pub fn default_zoom(&self) -> f64 {
        (self.max_zoom - INITIAL_ZOOM_OFFSET).max(0.0)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(0.0).min(self.max_zoom.max(0.0))
    }
}

/// Zoom at which one image pixel is one screen pixel. An image smaller than
/// one tile is shown at zoom 0.
pub fn native_zoom(map_size_pixels: f64, tile_size_pixels: f64) -> f64 {
    (map_size_pixels / tile_size_pixels).log2().round().max(0.0)
}
