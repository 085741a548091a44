use crate::crs::PlanePoint;

/// View state requested by the page URL, already decoded into key/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepLink {
    pub zoom: Option<f64>,
    pub center: Option<PlanePoint>,
    pub layer: Option<String>,
    pub marker_id: Option<String>,
}

impl DeepLink {
    /// Recognised keys: `z`, `x`/`lat`, `y`/`lng`, `l`, `m`/`id`.
    /// Unparseable numbers are ignored; a center needs both axes.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut zoom = None;
        let (mut x, mut lat, mut y, mut lng) = (None, None, None, None);
        let (mut layer, mut m, mut id) = (None, None, None);

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "z" => zoom = parse_number(value),
                "x" => x = parse_number(value),
                "lat" => lat = parse_number(value),
                "y" => y = parse_number(value),
                "lng" => lng = parse_number(value),
                "l" => layer = non_empty(value),
                "m" => m = non_empty(value),
                "id" => id = non_empty(value),
                _ => {}
            }
        }

        let center = match (x.or(lat), y.or(lng)) {
            (Some(lat), Some(lng)) => Some(PlanePoint::new(lat, lng)),
            _ => None,
        };
        Self {
            zoom,
            center,
            layer,
            marker_id: m.or(id),
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_every_recognised_key() {
        let link = DeepLink::from_pairs([
            ("z", "3"),
            ("x", "120"),
            ("y", "-40.5"),
            ("l", "Sky"),
            ("m", "chest-1"),
            ("utm_source", "wiki"),
        ]);
        assert_eq!(link.zoom, Some(3.0));
        assert_eq!(link.center, Some(PlanePoint::new(120.0, -40.5)));
        assert_eq!(link.layer.as_deref(), Some("Sky"));
        assert_eq!(link.marker_id.as_deref(), Some("chest-1"));
    }

    #[test]
    fn falls_back_to_lat_lng_and_id() {
        let link = DeepLink::from_pairs([("lat", "1"), ("lng", "2"), ("id", "warp-3")]);
        assert_eq!(link.center, Some(PlanePoint::new(1.0, 2.0)));
        assert_eq!(link.marker_id.as_deref(), Some("warp-3"));
    }

    #[test]
    fn ignores_garbage_and_half_centers() {
        let link = DeepLink::from_pairs([("z", "abc"), ("x", "10"), ("m", "")]);
        assert_eq!(link, DeepLink::default());
        let link = DeepLink::from_pairs([("z", "NaN")]);
        assert_eq!(link.zoom, None);
    }
}
