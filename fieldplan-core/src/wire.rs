//! GeoJSON interchange.
//!
//! Each entity maps to one `geojson::Feature` whose properties carry the
//! entity's attributes by name. Collections record their CRS in a `crs`
//! foreign member; a collection without one is WGS84, as RFC 7946 requires.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::association::AnnotatedCell;
use crate::cell::{Cell, CellError};
use crate::crs::{Crs, CrsError, Layer, LocalProjection};
use crate::depot::Depot;
use crate::region::{Region, RegionError};
use crate::route::{MacroRoute, MicroRoute};
use crate::target::{Target, TargetLink};

const WGS84_NAMES: [&str; 3] = ["EPSG:4326", "urn:ogc:def:crs:OGC:1.3:CRS84", "OGC:CRS84"];

/// Errors raised while decoding features.
#[derive(Debug, Error)]
pub enum WireError {
    /// The feature has no geometry.
    #[error("feature has no geometry")]
    MissingGeometry,
    /// The geometry type does not match the entity.
    #[error("expected {expected} geometry")]
    UnexpectedGeometry {
        /// Geometry type the entity requires.
        expected: &'static str,
    },
    /// The GeoJSON geometry could not be converted.
    #[error("invalid geometry: {0}")]
    Geometry(#[source] Box<geojson::Error>),
    /// A required property is absent.
    #[error("missing property `{name}`")]
    MissingProperty {
        /// Property name.
        name: &'static str,
    },
    /// A property holds a value of the wrong shape.
    #[error("invalid property `{name}`: {source}")]
    InvalidProperty {
        /// Property name.
        name: &'static str,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The collection's `crs` member is not understood.
    #[error("unsupported crs member: {0}")]
    UnsupportedCrs(String),
    /// The collection's local projection origin is unusable.
    #[error(transparent)]
    Crs(#[from] CrsError),
    /// A decoded cell has no area.
    #[error(transparent)]
    Cell(#[from] CellError),
    /// A decoded region outline is invalid.
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Entities that encode to a GeoJSON feature.
pub trait ToFeature {
    /// Encode as a feature.
    fn to_feature(&self) -> Feature;
}

/// Entities that decode from a GeoJSON feature.
pub trait FromFeature: Sized {
    /// Decode from a feature.
    fn from_feature(feature: &Feature) -> Result<Self, WireError>;
}

impl<T: ToFeature> Layer<T> {
    /// Encode the layer as a feature collection tagged with its CRS.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::Coord;
    /// use fieldplan_core::{Crs, Layer, Target};
    ///
    /// let layer = Layer::new(Crs::Wgs84, vec![Target::new("t-1", Coord { x: 1.0, y: 2.0 })]);
    /// let collection = layer.to_feature_collection();
    /// assert_eq!(collection.features.len(), 1);
    /// let decoded = Layer::<Target>::from_feature_collection(&collection).unwrap();
    /// assert_eq!(decoded, layer);
    /// ```
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(ToFeature::to_feature).collect(),
            foreign_members: Some(crs_member(self.crs)),
        }
    }
}

impl<T: FromFeature> Layer<T> {
    /// Decode a feature collection, reading its CRS member.
    pub fn from_feature_collection(collection: &FeatureCollection) -> Result<Self, WireError> {
        let crs = collection_crs(collection)?;
        let features = collection
            .features
            .iter()
            .map(T::from_feature)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(crs, features))
    }
}

impl Region {
    /// Encode the outline as a single-feature collection.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut properties = JsonObject::new();
        properties.insert("name".to_owned(), json!(self.name));
        FeatureCollection {
            bbox: None,
            features: vec![feature(geojson::Value::from(self.outline()), properties)],
            foreign_members: Some(crs_member(self.crs())),
        }
    }

    /// Decode a region from a collection, unioning every polygonal feature.
    ///
    /// The first feature's `name` property names the region.
    pub fn from_feature_collection(collection: &FeatureCollection) -> Result<Self, WireError> {
        let crs = collection_crs(collection)?;
        let mut outline = MultiPolygon::new(Vec::new());
        for item in &collection.features {
            let part = polygonal(item)?;
            outline = if outline.0.is_empty() {
                part
            } else {
                outline.union(&part)
            };
        }
        let name = match collection.features.first() {
            Some(first) => optional::<String>(first, "name")?,
            None => None,
        };
        let region = Self::new(crs, outline)?;
        Ok(match name {
            Some(name) => region.with_name(name),
            None => region,
        })
    }
}

impl ToFeature for Cell {
    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("cell_id".to_owned(), json!(self.id));
        feature(geojson::Value::from(self.geometry()), properties)
    }
}

impl FromFeature for Cell {
    fn from_feature(feature: &Feature) -> Result<Self, WireError> {
        let geometry = polygonal(feature)?;
        let id = required(feature, "cell_id")?;
        Ok(Self::new(id, geometry)?)
    }
}

impl ToFeature for AnnotatedCell {
    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("cell_id".to_owned(), json!(self.cell.id));
        properties.insert(
            "associated_depots".to_owned(),
            json!(self.association.associated_depots),
        );
        properties.insert(
            "closest_depot".to_owned(),
            json!(self.association.closest_depot),
        );
        properties.insert("distance".to_owned(), json!(self.association.distance));
        properties.insert("target_count".to_owned(), json!(self.workload.target_count));
        properties.insert("workload".to_owned(), json!(self.workload.workload));
        feature(geojson::Value::from(self.cell.geometry()), properties)
    }
}

impl ToFeature for Depot {
    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("depot_id".to_owned(), json!(self.id));
        properties.insert("depot_radius".to_owned(), json!(self.radius));
        properties.insert(
            "min_enclosing_radius".to_owned(),
            json!(self.min_enclosing_radius),
        );
        feature(geojson::Value::from(&Point::from(self.location)), properties)
    }
}

impl FromFeature for Depot {
    fn from_feature(feature: &Feature) -> Result<Self, WireError> {
        let location = point(feature)?;
        let mut depot = Self::new(
            required::<String>(feature, "depot_id")?,
            location,
            required(feature, "depot_radius")?,
        );
        depot.min_enclosing_radius = optional(feature, "min_enclosing_radius")?.unwrap_or(0.0);
        Ok(depot)
    }
}

fn target_properties(target: &Target) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("target_id".to_owned(), json!(target.id));
    if let Some(name) = &target.region_name {
        properties.insert("region_name".to_owned(), json!(name));
    }
    if let Some(version) = &target.region_outline_version {
        properties.insert("region_outline_version".to_owned(), json!(version));
    }
    properties
}

impl ToFeature for Target {
    fn to_feature(&self) -> Feature {
        feature(
            geojson::Value::from(&Point::from(self.location)),
            target_properties(self),
        )
    }
}

impl FromFeature for Target {
    fn from_feature(feature: &Feature) -> Result<Self, WireError> {
        let location = point(feature)?;
        Ok(Self {
            id: required(feature, "target_id")?,
            location,
            region_name: optional(feature, "region_name")?,
            region_outline_version: optional(feature, "region_outline_version")?,
        })
    }
}

impl ToFeature for TargetLink {
    fn to_feature(&self) -> Feature {
        let mut properties = target_properties(&self.target);
        properties.insert("cell_id".to_owned(), json!(self.cell_id));
        let (route_id, depot_id) = self
            .route
            .as_ref()
            .map_or((None, None), |route| {
                (Some(&route.route_id), Some(&route.depot_id))
            });
        properties.insert("route_id".to_owned(), json!(route_id));
        properties.insert("closest_depot".to_owned(), json!(depot_id));
        feature(
            geojson::Value::from(&Point::from(self.target.location)),
            properties,
        )
    }
}

impl ToFeature for MacroRoute {
    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("route_id".to_owned(), json!(self.id));
        properties.insert("route_depot".to_owned(), json!(self.depot_id));
        properties.insert("route_cells".to_owned(), json!(self.cells));
        feature(geojson::Value::from(&self.path), properties)
    }
}

impl FromFeature for MacroRoute {
    fn from_feature(feature: &Feature) -> Result<Self, WireError> {
        let path = line(feature)?;
        Ok(Self {
            id: required(feature, "route_id")?,
            depot_id: required(feature, "route_depot")?,
            cells: required(feature, "route_cells")?,
            path,
        })
    }
}

impl ToFeature for MicroRoute {
    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("route_id".to_owned(), json!(self.id));
        properties.insert("closest_depot".to_owned(), json!(self.depot_id));
        properties.insert("route_cells".to_owned(), json!(self.cells));
        properties.insert("target_ids".to_owned(), json!(self.target_ids));
        properties.insert("total_distance".to_owned(), json!(self.total_distance));
        feature(geojson::Value::from(&self.path), properties)
    }
}

impl FromFeature for MicroRoute {
    fn from_feature(feature: &Feature) -> Result<Self, WireError> {
        let path = line(feature)?;
        Ok(Self {
            id: required(feature, "route_id")?,
            depot_id: required(feature, "closest_depot")?,
            cells: required(feature, "route_cells")?,
            target_ids: optional(feature, "target_ids")?.unwrap_or_default(),
            path,
            total_distance: required(feature, "total_distance")?,
        })
    }
}

fn feature(value: geojson::Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn crs_member(crs: Crs) -> JsonObject {
    let value = match crs {
        Crs::Wgs84 => json!({"type": "name", "properties": {"name": "EPSG:4326"}}),
        Crs::Local(projection) => {
            let origin = projection.origin();
            json!({"type": "local", "properties": {"origin": [origin.x, origin.y]}})
        }
    };
    let mut members = JsonObject::new();
    members.insert("crs".to_owned(), value);
    members
}

fn collection_crs(collection: &FeatureCollection) -> Result<Crs, WireError> {
    let Some(member) = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
    else {
        return Ok(Crs::Wgs84);
    };
    let kind = member.get("type").and_then(JsonValue::as_str);
    let properties = member.get("properties");
    match kind {
        Some("name") => {
            let name = properties
                .and_then(|p| p.get("name"))
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            if WGS84_NAMES.contains(&name) {
                Ok(Crs::Wgs84)
            } else {
                Err(WireError::UnsupportedCrs(name.to_owned()))
            }
        }
        Some("local") => {
            let origin: [f64; 2] = properties
                .and_then(|p| p.get("origin"))
                .cloned()
                .map(serde_json::from_value::<[f64; 2]>)
                .transpose()
                .map_err(|source| WireError::InvalidProperty {
                    name: "crs.origin",
                    source,
                })?
                .ok_or_else(|| WireError::UnsupportedCrs(member.to_string()))?;
            let [x, y] = origin;
            Ok(Crs::Local(LocalProjection::new(Coord { x, y })?))
        }
        _ => Err(WireError::UnsupportedCrs(member.to_string())),
    }
}

fn geometry(feature: &Feature) -> Result<geo::Geometry<f64>, WireError> {
    let geometry = feature.geometry.as_ref().ok_or(WireError::MissingGeometry)?;
    geo::Geometry::<f64>::try_from(geometry.value.clone())
        .map_err(|err| WireError::Geometry(Box::new(err)))
}

fn polygonal(feature: &Feature) -> Result<MultiPolygon<f64>, WireError> {
    match geometry(feature)? {
        geo::Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        geo::Geometry::MultiPolygon(multi) => Ok(multi),
        _ => Err(WireError::UnexpectedGeometry {
            expected: "Polygon or MultiPolygon",
        }),
    }
}

fn point(feature: &Feature) -> Result<Coord<f64>, WireError> {
    match geometry(feature)? {
        geo::Geometry::Point(point) => Ok(point.0),
        _ => Err(WireError::UnexpectedGeometry { expected: "Point" }),
    }
}

fn line(feature: &Feature) -> Result<LineString<f64>, WireError> {
    match geometry(feature)? {
        geo::Geometry::LineString(line) => Ok(line),
        _ => Err(WireError::UnexpectedGeometry {
            expected: "LineString",
        }),
    }
}

fn required<T: DeserializeOwned>(feature: &Feature, name: &'static str) -> Result<T, WireError> {
    optional(feature, name)?.ok_or(WireError::MissingProperty { name })
}

fn optional<T: DeserializeOwned>(
    feature: &Feature,
    name: &'static str,
) -> Result<Option<T>, WireError> {
    match feature.property(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| WireError::InvalidProperty { name, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{CellAssociation, CellWorkload};
    use geo::{Rect, line_string};
    use rstest::{fixture, rstest};

    #[fixture]
    fn cell() -> Cell {
        let square = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        Cell::new(5, MultiPolygon::new(vec![square.to_polygon()])).expect("valid cell")
    }

    #[rstest]
    fn cells_round_trip(cell: Cell) {
        let decoded = Cell::from_feature(&cell.to_feature()).expect("decodes");
        assert_eq!(decoded, cell);
    }

    #[rstest]
    fn annotated_cells_expose_association(cell: Cell) {
        let annotated = AnnotatedCell {
            cell,
            association: CellAssociation {
                cell_id: 5,
                associated_depots: vec!["depot_1".into()],
                closest_depot: None,
                distance: None,
            },
            workload: CellWorkload::empty(5),
        };
        let encoded = annotated.to_feature();
        assert_eq!(encoded.property("closest_depot"), Some(&JsonValue::Null));
        assert_eq!(encoded.property("associated_depots"), Some(&json!(["depot_1"])));
    }

    #[rstest]
    fn local_crs_survives_collections() {
        let projection = LocalProjection::new(Coord { x: -105.0, y: 40.0 }).expect("valid");
        let route = MacroRoute {
            id: "depot_0_R0".into(),
            depot_id: "depot_0".into(),
            cells: vec![2, 0],
            path: line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 5.0), (x: 0.0, y: 0.0)],
        };
        let layer = Layer::new(Crs::Local(projection), vec![route]);
        let decoded = Layer::<MacroRoute>::from_feature_collection(&layer.to_feature_collection())
            .expect("decodes");
        assert_eq!(decoded, layer);
    }

    #[rstest]
    fn missing_crs_defaults_to_wgs84() {
        let collection = FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        };
        let layer = Layer::<Depot>::from_feature_collection(&collection).expect("decodes");
        assert_eq!(layer.crs, Crs::Wgs84);
    }

    #[rstest]
    fn unknown_crs_is_rejected() {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_owned(),
            json!({"type": "name", "properties": {"name": "EPSG:32613"}}),
        );
        let collection = FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: Some(members),
        };
        let result = Layer::<Depot>::from_feature_collection(&collection);
        assert!(matches!(result, Err(WireError::UnsupportedCrs(_))));
    }

    #[rstest]
    fn missing_properties_are_reported() {
        let bare = feature(
            geojson::Value::from(&Point::new(0.0, 0.0)),
            JsonObject::new(),
        );
        let result = Depot::from_feature(&bare);
        assert!(matches!(
            result,
            Err(WireError::MissingProperty { name: "depot_id" })
        ));
    }

    #[rstest]
    fn point_entities_reject_polygons(cell: Cell) {
        let result = Target::from_feature(&cell.to_feature());
        assert!(matches!(result, Err(WireError::UnexpectedGeometry { .. })));
    }

    #[rstest]
    fn geometry_is_checked_before_properties(cell: Cell) {
        let polygon = cell.to_feature();
        assert!(matches!(
            Depot::from_feature(&polygon),
            Err(WireError::UnexpectedGeometry { .. })
        ));
        assert!(matches!(
            MacroRoute::from_feature(&polygon),
            Err(WireError::UnexpectedGeometry { .. })
        ));
        let dot = feature(
            geojson::Value::from(&Point::new(1.0, 2.0)),
            JsonObject::new(),
        );
        assert!(matches!(
            Cell::from_feature(&dot),
            Err(WireError::UnexpectedGeometry { .. })
        ));
    }
}
