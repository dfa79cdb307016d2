// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route geometry: segments of track points drawn as separate polylines.

use crate::models::TrackPoint;
use geo::Coord;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde::Serialize;

/// Polyline precision used by the map renderer.
const POLYLINE_PRECISION: u32 = 5;

/// A contiguous, gap-free run of track points. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    points: Vec<TrackPoint>,
}

impl Segment {
    /// Start a segment with its first point.
    pub fn start(point: TrackPoint) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Encoded polyline (precision 5) for the map renderer.
    pub fn encoded_polyline(&self) -> Result<String, String> {
        let coords = self.points.iter().map(|p| Coord {
            x: p.longitude,
            y: p.latitude,
        });
        polyline::encode_coordinates(coords, POLYLINE_PRECISION).map_err(|e| e.to_string())
    }
}

/// Ordered segments of one recording session, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    segments: Vec<Segment>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Open a new segment holding only `point`.
    pub fn start_segment(&mut self, point: TrackPoint) {
        self.segments.push(Segment::start(point));
    }

    /// Append to the current segment, opening one if the route is empty.
    pub fn append(&mut self, point: TrackPoint) {
        match self.segments.last_mut() {
            Some(segment) => segment.push(point),
            None => self.start_segment(point),
        }
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Segment::is_empty)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// The whole route as a GeoJSON `MultiLineString` feature.
    pub fn to_geojson(&self) -> Feature {
        let lines = self
            .segments
            .iter()
            .map(|segment| {
                segment
                    .points()
                    .iter()
                    .map(|p| vec![p.longitude, p.latitude])
                    .collect()
            })
            .collect();

        let mut properties = JsonObject::new();
        properties.insert("segments".to_string(), self.segments.len().into());
        properties.insert("points".to_string(), self.point_count().into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::MultiLineString(lines))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
