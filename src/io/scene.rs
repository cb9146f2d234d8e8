//! File-backed tracking host.
//!
//! A scene is a YAML file listing cameras, motion-tracking clips and
//! objects. Marker and position tables live in headerless CSV files next to
//! it (`#` starts a comment line):
//!
//! ```text
//! markers:   frame, muted          e.g. 12,0
//! positions: frame, x, y, z        e.g. 12,0.25,-1.5,3.0
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use nalgebra::Vector3;
use serde::Deserialize;

use crate::fusion::{CameraId, FuserConfig};
use crate::host::{
    Constraint, FollowTrackConstraint, Marker, MotionTrack, ObjectKind, TrackingHost,
};

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub constraints: Vec<Constraint>,
    pub positions: BTreeMap<i64, Vector3<f64>>,
}

/// In-memory scene, usually loaded with [`Scene::load`]. Cameras are static.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Fusion settings from the optional `fusion:` section.
    pub fusion: FuserConfig,
    cameras: HashMap<CameraId, Vector3<f64>>,
    clips: HashMap<String, Vec<MotionTrack>>,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene YAML file. Relative CSV paths resolve against the
    /// file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let file: SceneYaml = serde_yaml::from_reader(
            File::open(path).with_context(|| format!("Failed to open {:?}", path))?,
        )
        .with_context(|| format!("Failed to parse scene {:?}", path))?;

        let mut scene = Scene::new();
        scene.fusion = file.fusion.unwrap_or_default();

        for camera in file.cameras {
            let [x, y, z] = camera.position;
            scene.add_camera(CameraId::new(camera.name), Vector3::new(x, y, z));
        }

        for clip in file.clips {
            for track in clip.tracks {
                let markers = load_marker_list(root.join(&track.markers))?;
                scene.add_track(&clip.name, MotionTrack {
                    name: track.name,
                    markers,
                });
            }
        }

        for object in file.objects {
            let kind = match object.kind.as_str() {
                "empty" => ObjectKind::Empty,
                other => ObjectKind::Other(other.to_string()),
            };
            let constraints = object
                .constraints
                .into_iter()
                .map(|c| c.into_constraint(&object.name))
                .collect::<Result<Vec<_>>>()?;
            let positions = match &object.positions {
                Some(file) => load_position_list(root.join(file))?,
                None => BTreeMap::new(),
            };
            scene.add_object(SceneObject {
                name: object.name,
                kind,
                constraints,
                positions,
            });
        }

        Ok(scene)
    }

    pub fn add_camera(&mut self, camera: CameraId, position: Vector3<f64>) {
        self.cameras.insert(camera, position);
    }

    /// Append a track to `clip`, creating the clip if needed.
    pub fn add_track(&mut self, clip: &str, track: MotionTrack) {
        self.clips.entry(clip.to_string()).or_default().push(track);
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Object names in file order.
    pub fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name.clone()).collect()
    }

    fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

impl TrackingHost for Scene {
    fn object_kind(&self, object: &str) -> Option<ObjectKind> {
        self.object(object).map(|o| o.kind.clone())
    }

    fn constraints(&self, object: &str) -> &[Constraint] {
        self.object(object)
            .map(|o| o.constraints.as_slice())
            .unwrap_or(&[])
    }

    fn clip_tracks(&self, clip: &str) -> Option<&[MotionTrack]> {
        self.clips.get(clip).map(Vec::as_slice)
    }

    fn world_position(&self, object: &str, frame: i64) -> Result<Vector3<f64>> {
        let Some(obj) = self.object(object) else {
            bail!("Unknown object {}", object);
        };
        obj.positions
            .get(&frame)
            .copied()
            .with_context(|| format!("Object {} has no position at frame {}", object, frame))
    }

    fn camera_position(&self, camera: &CameraId, _frame: i64) -> Result<Vector3<f64>> {
        self.cameras
            .get(camera)
            .copied()
            .with_context(|| format!("Unknown camera {}", camera))
    }
}

#[derive(Debug, Deserialize)]
struct SceneYaml {
    #[serde(default)]
    fusion: Option<FuserConfig>,
    #[serde(default)]
    cameras: Vec<CameraYaml>,
    #[serde(default)]
    clips: Vec<ClipYaml>,
    #[serde(default)]
    objects: Vec<ObjectYaml>,
}

#[derive(Debug, Deserialize)]
struct CameraYaml {
    name: String,
    position: [f64; 3],
}

#[derive(Debug, Deserialize)]
struct ClipYaml {
    name: String,
    #[serde(default)]
    tracks: Vec<TrackYaml>,
}

#[derive(Debug, Deserialize)]
struct TrackYaml {
    name: String,
    /// CSV of `frame, muted`.
    markers: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ObjectYaml {
    name: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    constraints: Vec<ConstraintYaml>,
    /// CSV of `frame, x, y, z`.
    positions: Option<PathBuf>,
}

fn default_kind() -> String {
    "empty".to_string()
}

#[derive(Debug, Deserialize)]
struct ConstraintYaml {
    #[serde(rename = "type")]
    kind: String,
    clip: Option<String>,
    track: Option<String>,
    camera: Option<String>,
}

impl ConstraintYaml {
    fn into_constraint(self, object: &str) -> Result<Constraint> {
        if self.kind != "follow_track" {
            return Ok(Constraint::Other(self.kind));
        }
        let Some(track) = self.track else {
            bail!("follow_track constraint on {} has no track", object);
        };
        let Some(camera) = self.camera else {
            bail!("follow_track constraint on {} has no camera", object);
        };
        Ok(Constraint::FollowTrack(FollowTrackConstraint {
            clip: self.clip,
            track,
            camera: CameraId::new(camera),
        }))
    }
}

fn parse_flag(field: &str) -> Result<bool> {
    match field {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => bail!("Expected a 0/1 flag, got {:?}", other),
    }
}

fn load_marker_list(csv_path: PathBuf) -> Result<Vec<Marker>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(&csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut markers = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.is_empty() {
            continue;
        }
        let frame: i64 = rec[0]
            .trim()
            .parse()
            .with_context(|| format!("Bad frame {:?} in {}", &rec[0], csv_path.display()))?;
        // A missing muted column means the marker is enabled.
        let muted = match rec.get(1) {
            Some(field) => parse_flag(field.trim())
                .with_context(|| format!("Bad muted flag in {}", csv_path.display()))?,
            None => false,
        };
        markers.push(Marker { frame, muted });
    }
    Ok(markers)
}

fn load_position_list(csv_path: PathBuf) -> Result<BTreeMap<i64, Vector3<f64>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .from_path(&csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut positions = BTreeMap::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.len() < 4 {
            bail!(
                "Expected 4 columns [frame, x, y, z] in {}, got {}",
                csv_path.display(),
                rec.len()
            );
        }
        let frame: i64 = rec[0].trim().parse()?;
        let position = Vector3::new(
            rec[1].trim().parse()?,
            rec[2].trim().parse()?,
            rec[3].trim().parse()?,
        );
        positions.insert(frame, position);
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_load_scene() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "markers.csv", "# frame,muted\n1,0\n2,1\n3\n");
        write(dir.path(), "positions.csv", "1,0.0,1.0,2.0\n3,0.5,1.0,2.0\n");
        write(
            dir.path(),
            "scene.yaml",
            r#"
fusion:
  frame_range: inclusive
cameras:
  - { name: CamA, position: [0.0, -5.0, 1.0] }
clips:
  - name: shot
    tracks:
      - { name: Track, markers: markers.csv }
objects:
  - name: EmptyA
    constraints:
      - { type: child_of }
      - { type: follow_track, clip: shot, track: Track, camera: CamA }
    positions: positions.csv
  - name: Cube
    kind: mesh
"#,
        );

        let scene = Scene::load(dir.path().join("scene.yaml")).unwrap();

        assert_eq!(scene.fusion.frame_range, crate::fusion::FrameRangePolicy::Inclusive);
        assert_eq!(scene.object_names(), vec!["EmptyA", "Cube"]);
        assert_eq!(scene.object_kind("EmptyA"), Some(ObjectKind::Empty));
        assert_eq!(scene.object_kind("Cube"), Some(ObjectKind::Other("mesh".into())));
        assert_eq!(scene.object_kind("Nope"), None);
        assert_eq!(scene.constraints("EmptyA").len(), 2);

        let tracks = scene.clip_tracks("shot").unwrap();
        assert_eq!(
            tracks[0].markers,
            vec![
                Marker { frame: 1, muted: false },
                Marker { frame: 2, muted: true },
                Marker { frame: 3, muted: false },
            ]
        );

        assert_eq!(
            scene.world_position("EmptyA", 3).unwrap(),
            Vector3::new(0.5, 1.0, 2.0)
        );
        assert!(scene.world_position("EmptyA", 2).is_err());
        assert_eq!(
            scene.camera_position(&CameraId::new("CamA"), 10).unwrap(),
            Vector3::new(0.0, -5.0, 1.0)
        );
    }

    #[test]
    fn test_follow_track_without_camera_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "scene.yaml",
            "objects:\n  - name: E\n    constraints:\n      - { type: follow_track, clip: c, track: t }\n",
        );

        let err = Scene::load(dir.path().join("scene.yaml")).unwrap_err();
        assert!(err.to_string().contains("no camera"));
    }

    #[test]
    fn test_bad_muted_flag_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "markers.csv", "1,maybe\n");
        assert!(load_marker_list(dir.path().join("markers.csv")).is_err());
    }

    #[test]
    fn test_short_position_row_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "positions.csv", "1,0.0,1.0\n");
        assert!(load_position_list(dir.path().join("positions.csv")).is_err());
    }
}
