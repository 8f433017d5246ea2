//! Flight plan container.

use std::collections::HashMap;

use crate::error::{PlanError, Result};

use super::reentry::ReentryPointId;
use super::waypoint::Waypoint;

/// Distance-based photo trigger command
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhotoTrigger {
    /// Triggering on (true) or off
    pub active: bool,
    /// Trigger spacing at the lowest ground distance (m)
    pub distance: f64,
    /// Trigger spacing at the highest ground distance (m)
    pub distance_max: f64,
    /// Waypoint after which triggering starts
    pub reentry: Option<ReentryPointId>,
}

/// One entry of the flight plan
#[derive(Clone, Debug, PartialEq)]
pub enum PlanItem {
    /// Camera power on/off
    CameraMarker { enable: bool },
    /// Trigger on/off
    PhotoTrigger(PhotoTrigger),
    /// End of a flight line
    LineDirection { line_id: u32, forward: bool, rot90: bool },
    Waypoint(Waypoint),
}

/// Ordered plan items with reentry lookup.
///
/// Every waypoint carries a reentry point that is unique within the plan;
/// inserting a duplicate is rejected.
#[derive(Clone, Debug, Default)]
pub struct FlightPlan {
    items: Vec<PlanItem>,
    /// Packed reentry id -> item index
    reentry_index: HashMap<u64, usize>,
}

impl FlightPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    pub fn push(&mut self, item: PlanItem) -> Result<()> {
        if let PlanItem::Waypoint(wp) = &item {
            let key = wp.reentry.pack()?;
            if self.reentry_index.contains_key(&key) {
                return Err(PlanError::DuplicateReentryPoint(key));
            }
            self.reentry_index.insert(key, self.items.len());
        }
        self.items.push(item);
        Ok(())
    }

    /// All items in flight order
    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True without items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Waypoints in flight order
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> + '_ {
        self.items.iter().filter_map(|item| match item {
            PlanItem::Waypoint(wp) => Some(wp),
            _ => None,
        })
    }

    /// Number of waypoints
    pub fn waypoint_count(&self) -> usize {
        self.reentry_index.len()
    }

    /// Waypoint with the given reentry point
    pub fn find_reentry(&self, id: &ReentryPointId) -> Option<&Waypoint> {
        let key = id.pack().ok()?;
        match self.items.get(*self.reentry_index.get(&key)?) {
            Some(PlanItem::Waypoint(wp)) => Some(wp),
            _ => None,
        }
    }

    /// Last waypoint so far
    pub fn last_waypoint(&self) -> Option<&Waypoint> {
        self.items.iter().rev().find_map(|item| match item {
            PlanItem::Waypoint(wp) => Some(wp),
            _ => None,
        })
    }

    /// Mutable waypoints; reentry points must stay unchanged.
    pub(crate) fn waypoints_mut(&mut self) -> impl Iterator<Item = &mut Waypoint> + '_ {
        self.items.iter_mut().filter_map(|item| match item {
            PlanItem::Waypoint(wp) => Some(wp),
            _ => None,
        })
    }

    pub(crate) fn last_waypoint_mut(&mut self) -> Option<&mut Waypoint> {
        self.items.iter_mut().rev().find_map(|item| match item {
            PlanItem::Waypoint(wp) => Some(wp),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GeodeticPosition, LocalVector3, Orientation};
    use crate::plan::AltitudeMode;

    fn waypoint(line_id: u32, ordinal: u32) -> Waypoint {
        Waypoint {
            position: GeodeticPosition::new(47.0, 8.0, 500.0),
            local: LocalVector3::ZERO,
            altitude_mode: AltitudeMode::Linear,
            speed: 10.0,
            orientation: Orientation::nadir(0.0),
            trigger_image: false,
            stop_time_s: 0.0,
            begin_flightline: ordinal == 1,
            reentry: ReentryPointId {
                line_id,
                ordinal,
                ..ReentryPointId::default()
            },
            target_distance: 0.0,
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut plan = FlightPlan::new();
        plan.push(PlanItem::CameraMarker { enable: true }).unwrap();
        plan.push(PlanItem::Waypoint(waypoint(1, 1))).unwrap();
        plan.push(PlanItem::Waypoint(waypoint(1, 2))).unwrap();
        let err = plan.push(PlanItem::Waypoint(waypoint(1, 2))).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateReentryPoint(_)));
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.waypoint_count(), 2);
    }

    #[test]
    fn test_find_reentry() {
        let mut plan = FlightPlan::new();
        for ordinal in 1..=3 {
            plan.push(PlanItem::Waypoint(waypoint(4, ordinal))).unwrap();
        }
        let id = ReentryPointId {
            line_id: 4,
            ordinal: 2,
            ..ReentryPointId::default()
        };
        assert_eq!(plan.find_reentry(&id).unwrap().reentry, id);
        assert!(plan.find_reentry(&id.with_ordinal(9)).is_none());
        assert_eq!(plan.last_waypoint().unwrap().reentry.ordinal, 3);
    }

    #[test]
    fn test_overflowing_id_rejected() {
        let mut plan = FlightPlan::new();
        let err = plan.push(PlanItem::Waypoint(waypoint(1 << 21, 1))).unwrap_err();
        assert!(matches!(err, PlanError::ReentryFieldOverflow { field: "line_id", .. }));
        assert!(plan.is_empty());
    }
}
