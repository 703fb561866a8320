use factgraph_core::FactKind;
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Keeps the focal node clear of the viewport edge.
pub const FOCAL_OFFSET: (f32, f32) = (75.0, -50.0);
const RING_FRACTION: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Target positions the external force layout pulls same-category nodes
/// toward. Recomputed whenever the viewport changes size.
#[derive(Debug, Clone)]
pub struct ClusterAnchors {
    anchors: HashMap<FactKind, Anchor>,
    focal: Anchor,
    fallback: Anchor,
}

impl ClusterAnchors {
    pub fn compute(width: f32, height: f32) -> ClusterAnchors {
        let cx = width / 2.0 + FOCAL_OFFSET.0;
        let cy = height / 2.0 + FOCAL_OFFSET.1;
        let radius = width.min(height) * RING_FRACTION;

        let count = FactKind::ACTION_KINDS.len() as f32;
        let mut anchors = HashMap::new();
        for (i, kind) in FactKind::ACTION_KINDS.iter().enumerate() {
            let angle = i as f32 / count * TAU;
            anchors.insert(
                *kind,
                Anchor {
                    x: cx + angle.cos() * radius,
                    y: cy + angle.sin() * radius,
                },
            );
        }

        ClusterAnchors {
            anchors,
            focal: Anchor { x: cx, y: cy },
            fallback: Anchor {
                x: cx,
                y: cy + radius * 0.5,
            },
        }
    }

    pub fn anchor(&self, kind: FactKind) -> Anchor {
        self.anchors.get(&kind).copied().unwrap_or(self.fallback)
    }

    /// Pinned position of the focal process.
    pub fn focal(&self) -> Anchor {
        self.focal
    }

    pub fn fallback(&self) -> Anchor {
        self.fallback
    }
}

impl Default for ClusterAnchors {
    fn default() -> Self {
        ClusterAnchors::compute(800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_sit_evenly_on_the_ring() {
        let anchors = ClusterAnchors::compute(800.0, 600.0);
        let focal = anchors.focal();
        let radius = 600.0 * RING_FRACTION;

        for kind in FactKind::ACTION_KINDS {
            let a = anchors.anchor(kind);
            let dist = ((a.x - focal.x).powi(2) + (a.y - focal.y).powi(2)).sqrt();
            assert!((dist - radius).abs() < 0.01, "{kind:?} off the ring");
        }

        // distinct slots
        let read = anchors.anchor(FactKind::ReadFile);
        let wrote = anchors.anchor(FactKind::WroteFile);
        assert!((read.x - wrote.x).abs() > 1.0 || (read.y - wrote.y).abs() > 1.0);
    }

    #[test]
    fn process_creation_falls_back_below_center() {
        let anchors = ClusterAnchors::compute(800.0, 600.0);
        let a = anchors.anchor(FactKind::CreatedProcess);
        assert_eq!(a, anchors.fallback());
        assert!(a.y > anchors.focal().y);
    }

    #[test]
    fn anchors_track_viewport_size() {
        let small = ClusterAnchors::compute(400.0, 300.0);
        let large = ClusterAnchors::compute(1600.0, 1200.0);
        assert_ne!(
            small.anchor(FactKind::ReadFile),
            large.anchor(FactKind::ReadFile)
        );
        assert_eq!(large.focal().x, 800.0 + FOCAL_OFFSET.0);
    }
}
