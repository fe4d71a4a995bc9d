use std::fs;

use bat_io::IoError;
use bat_scene::camera::CameraUpdate;
use bat_scene::object::UNLABELED_COLOR;
use bat_scene::palette::InstancePalette;
use bat_scene::render::PointSplatRenderer;
use bat_scene::vertices::VertexSelection;
use bat_scene::{Scene, SceneError};

const SCENE: &str = r#"{
    "render": {"resolution_x": 48, "resolution_y": 36, "resolution_percentage": 50},
    "camera": "Camera",
    "frame": 3,
    "objects": [
        {"name": "Camera", "location": [0, -10, 0], "rotation": [1.5707963267948966, 0, 0]},
        {"name": "Car", "vertices": [[0, 0, 0], [1, 0, 0]]},
        {"name": "Alice", "location": [-1, 0, 0], "vertices": [[0, 0, 0]]},
        {"name": "Bob", "location": [0, 0, -1], "vertices": [[0, 0, 0]]},
        {"name": "Wheel", "parent": "Car", "location": [0, 0, 1], "vertices": [[0, 0, 0]]}
    ],
    "collections": [
        {"name": "Vehicles", "objects": ["Car"], "children": ["Parts"]},
        {"name": "Parts", "objects": ["Wheel"]},
        {"name": "People", "objects": ["Alice", "Bob"]}
    ],
    "classes": [
        {"name": "Vehicle", "collection": "Vehicles", "mask_color": [1, 0, 0, 1]},
        {"name": "Person", "collection": "People", "is_instances": true}
    ]
}"#;

fn load_scene(dir: &tempfile::TempDir) -> Result<Scene, Box<dyn std::error::Error>> {
    let path = dir.path().join("scene.json");
    fs::write(&path, SCENE)?;
    Ok(Scene::load(&path)?
        .with_output_dir(dir.path().join("renders"))
        .with_renderer(Box::new(PointSplatRenderer::new(1))))
}

#[test]
fn load_scene_description() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let scene = load_scene(&tmp_dir)?;

    assert_eq!(scene.frame(), 3);
    assert_eq!(scene.render_settings().size(), [24, 18].into());
    assert_eq!(scene.camera_name(), Some("Camera"));
    assert_eq!(scene.find_root("Wheel")?, "Car");
    assert_eq!(
        scene.collections().all_objects("Vehicles")?,
        vec!["Car", "Wheel"]
    );
    // the camera is not part of any collection and ends up in the root
    assert!(scene
        .collections()
        .root()
        .is_some_and(|root| root.objects.iter().any(|o| o == "Camera")));
    assert!(scene.distortion_map().is_some());
    Ok(())
}

#[test]
fn load_missing_or_invalid_scene() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    assert!(matches!(
        Scene::load(tmp_dir.path().join("missing.json")),
        Err(SceneError::Io(IoError::FileDoesNotExist(_)))
    ));

    let path = tmp_dir.path().join("broken.json");
    fs::write(&path, r#"{"render": {"resolution_x": 4}}"#)?;
    assert!(matches!(
        Scene::load(&path),
        Err(SceneError::InvalidDescription(_))
    ));
    Ok(())
}

#[test]
fn annotation_render() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let mut scene = load_scene(&tmp_dir)?;

    let (mask, report) = scene.render_annotation(true)?;
    assert!(report.is_complete());
    assert_eq!(report.assigned, 4);

    assert_eq!(scene.object("Wheel")?.pass_index, 1);
    assert_eq!(scene.object("Camera")?.color, UNLABELED_COLOR);
    let alice = InstancePalette::color(0).ok_or("empty palette")?;
    assert_eq!(scene.object("Alice")?.color, alice);

    // the car origin projects next to the principal point and is the closest vertex there
    assert_eq!(mask.pixel(12, 9)?, &[1.0, 0.0, 0.0, 1.0]);

    let renders = tmp_dir.path().join("renders");
    assert!(renders.join("0003_annotation.png").exists());
    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(renders.join("0003_class_info.json"))?)?;
    assert_eq!(
        info,
        serde_json::json!({"0": "Background", "1": "Vehicle", "2": "Person"})
    );
    Ok(())
}

#[test]
fn depth_render() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let scene = load_scene(&tmp_dir)?;

    let depth = scene.render_depth(true)?;
    assert_eq!(depth.size(), [24, 18].into());
    assert_eq!(depth.pixel(12, 9)?, &[10.0]);
    assert_eq!(depth.pixel(0, 0)?, &[0.0]);

    // 128 bytes of npy header followed by the float32 samples
    let npy = fs::read(tmp_dir.path().join("renders/0003_depth_map.npy"))?;
    assert_eq!(npy.len(), 128 + 24 * 18 * 4);
    Ok(())
}

#[test]
fn import_calibration_reorders_distortion() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let mut scene = load_scene(&tmp_dir)?;

    let path = tmp_dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"{"cam_mtx": [[20, 0, 11], [0, 22, 8], [0, 0, 1]], "dist": [1, 2, 3, 4, 5, 6]}"#,
    )?;
    scene.import_calibration(&path)?;

    let settings = scene.camera_settings();
    assert_eq!(settings.intrinsics.fx, 20.0);
    assert_eq!(settings.intrinsics.fy, 22.0);
    assert_eq!(settings.intrinsics.px, 11.0);
    assert_eq!(settings.intrinsics.py, 8.0);
    let d = settings.distortion;
    assert_eq!([d.k1, d.k2, d.p1, d.p2, d.k3, d.k4], [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    Ok(())
}

#[test]
fn invalid_calibration_leaves_camera_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let mut scene = load_scene(&tmp_dir)?;
    scene.update_camera(&CameraUpdate {
        k1: Some(0.05),
        ..Default::default()
    })?;
    let before = *scene.camera_settings();

    let path = tmp_dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"{"cam_mtx": [[20, 0, 11], [0, 22, 8], [0, 0, 1]], "dist": [1, 2, 3]}"#,
    )?;
    assert!(matches!(
        scene.import_calibration(&path),
        Err(SceneError::Io(IoError::DistortionShape))
    ));
    assert_eq!(*scene.camera_settings(), before);
    Ok(())
}

#[test]
fn vertices_follow_distortion() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let mut scene = load_scene(&tmp_dir)?;

    let selection = "1".parse::<VertexSelection>()?;
    let undistorted = scene.project_vertices("Car", &selection)?;

    scene.update_camera(&CameraUpdate {
        k1: Some(0.2),
        ..Default::default()
    })?;
    let distorted = scene.project_vertices("Car", &selection)?;

    // barrel distortion pushes the vertex away from the principal point
    let [y0, x0] = undistorted.coordinates_2d[0];
    let [y1, x1] = distorted.coordinates_2d[0];
    assert!((y1 - y0).abs() < 1e-9);
    assert!(x1 > x0);
    assert_eq!(undistorted.coordinates_3d, distorted.coordinates_3d);
    assert_eq!(undistorted.distance_from_cam, distorted.distance_from_cam);
    Ok(())
}
