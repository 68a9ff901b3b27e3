//! Assigns stable ids to face detections across frames.
//!
//! Association runs in two passes: confident detections claim tracks
//! first, then weak detections may only extend tracks that are still
//! unclaimed. Weak detections never start new tracks, so a momentary
//! confidence dip keeps the id alive without spawning ghosts.
use std::collections::HashSet;

use crate::shared::geometry::BoundingBox;

/// Detections at or above this score may open new tracks.
const HIGH_THRESH: f64 = 0.5;

/// Minimum IoU for a detection to continue an existing track.
const MATCH_THRESH: f64 = 0.3;

#[derive(Clone, Debug)]
pub struct TrackerInput {
    pub bbox: BoundingBox,
    pub score: f64,
}

/// A track matched in the current frame, pointing back at its detection.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
    pub id: u32,
    pub bbox: BoundingBox,
    pub det_index: usize,
}

#[derive(Clone, Debug)]
struct Track {
    id: u32,
    bbox: BoundingBox,
    frames_lost: usize,
    det_index: Option<usize>,
}

pub struct FaceTracker {
    tracks: Vec<Track>,
    next_id: u32,
    max_lost: usize,
}

impl FaceTracker {
    pub fn new(max_lost: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_lost,
        }
    }

    /// Number of tracks retained, including ones currently lost.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn update(&mut self, detections: &[TrackerInput]) -> Vec<TrackedFace> {
        for track in &mut self.tracks {
            track.det_index = None;
        }

        let (strong, weak): (Vec<usize>, Vec<usize>) =
            (0..detections.len()).partition(|&i| detections[i].score >= HIGH_THRESH);

        let claimed = self.associate(&strong, detections);
        self.associate(&weak, detections);

        for &di in &strong {
            if !claimed.contains(&di) {
                self.tracks.push(Track {
                    id: self.next_id,
                    bbox: detections[di].bbox,
                    frames_lost: 0,
                    det_index: Some(di),
                });
                self.next_id += 1;
            }
        }

        for track in &mut self.tracks {
            if track.det_index.is_none() {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| t.frames_lost <= max_lost);

        self.tracks
            .iter()
            .filter_map(|t| {
                t.det_index.map(|det_index| TrackedFace {
                    id: t.id,
                    bbox: t.bbox,
                    det_index,
                })
            })
            .collect()
    }

    /// Greedy IoU matching of `candidates` against unclaimed tracks, best
    /// overlap first. Returns the detection indices that were consumed.
    fn associate(&mut self, candidates: &[usize], detections: &[TrackerInput]) -> HashSet<usize> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            if track.det_index.is_some() {
                continue;
            }
            for &di in candidates {
                let iou = track.bbox.iou(&detections[di].bbox);
                if iou >= MATCH_THRESH {
                    pairs.push((ti, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut used_tracks = HashSet::new();
        let mut used_dets = HashSet::new();
        for (ti, di, _) in pairs {
            if used_tracks.contains(&ti) || used_dets.contains(&di) {
                continue;
            }
            used_tracks.insert(ti);
            used_dets.insert(di);
            let track = &mut self.tracks[ti];
            track.bbox = detections[di].bbox;
            track.frames_lost = 0;
            track.det_index = Some(di);
        }
        used_dets
    }
}
