use argh::FromArgs;
use bat::remote::{ExecutorOptions, MainThreadExecutor, RemoteConfig, RemoteServer, ServerOptions};
use bat::scene::annotation::AnnotationClass;
use bat::scene::camera::RenderSettings;
use bat::scene::collection::{Collection, ROOT_COLLECTION_NAME};
use bat::scene::object::SceneObject;
use bat::scene::{Scene, SceneError};
use std::{
    f64::consts::FRAC_PI_2,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(FromArgs, Debug)]
/// Serve a scene to remote annotation clients
struct Args {
    /// port of the remote server
    #[argh(option, short = 'p', default = "12345")]
    port: u16,
    /// do not start the remote server
    #[argh(switch)]
    disable_http: bool,
    /// width of the renders when no scene file is given
    #[argh(option, short = 'w', default = "640")]
    width: usize,
    /// height of the renders when no scene file is given
    #[argh(option, short = 'h', default = "480")]
    height: usize,
    /// path to a camera calibration json file
    #[argh(option, short = 'c')]
    calibration: Option<PathBuf>,
    /// directory the renders are written to
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
    /// period of the main thread in milliseconds
    #[argh(option, default = "1000")]
    tick_ms: u64,
    /// how long queries wait for the main thread, in milliseconds
    #[argh(option, default = "5000")]
    timeout_ms: u64,
    /// path to a scene description json file
    #[argh(option, short = 's')]
    scene: Option<PathBuf>,
}

// a camera looking at a unit cube from 10 units away
fn demo_scene(width: usize, height: usize) -> Result<Scene, SceneError> {
    let mut scene = Scene::new(RenderSettings::new(width, height));

    let corners = (0..8)
        .map(|i| {
            let s = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            [s(1), s(2), s(4)]
        })
        .collect();

    scene.add_object(
        SceneObject::new("Camera").with_pose([0.0, -10.0, 0.0], [FRAC_PI_2, 0.0, 0.0]),
    )?;
    scene.add_object(SceneObject::new("Cube").with_vertices(corners))?;
    scene.set_camera("Camera")?;

    scene
        .collections_mut()
        .insert(ROOT_COLLECTION_NAME, Collection::new("Cubes"))?;
    scene.collections_mut().link_object("Cubes", "Cube")?;
    scene
        .classes_mut()
        .add_class(AnnotationClass::new("Cube", "Cubes", [1.0, 0.0, 0.0, 1.0]))?;

    Ok(scene)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => demo_scene(args.width, args.height)?,
    };
    if let Some(output) = args.output {
        scene = scene.with_output_dir(output);
    }
    match &args.calibration {
        Some(path) => scene.import_calibration(path)?,
        None => {
            scene.regenerate_distortion_map()?;
        }
    }

    log::info!("🚀 Starting the annotation server");
    log::info!("📷 Render size: {}", scene.render_settings().size());
    log::info!("📂 Writing renders to: {}", scene.output_dir().display());

    let mut executor = MainThreadExecutor::new(scene);

    let config = RemoteConfig {
        http_enable: !args.disable_http,
        http_port: args.port,
    };
    let options = ServerOptions {
        request_timeout: Duration::from_millis(args.timeout_ms),
        ..Default::default()
    };
    let mut server = RemoteServer::new(executor.handle(), config, options);
    server.start()?;

    // create a cancel token to stop the main thread
    let cancel_token = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            log::info!("Received Ctrl-C signal. Shutting down !!");
            cancel_token.store(true, Ordering::SeqCst);
        }
    })?;

    log::info!("🔧 Press Ctrl+C to stop the server");

    let executor_options = ExecutorOptions {
        tick: Duration::from_millis(args.tick_ms),
    };
    executor.run(&executor_options, &cancel_token);

    server.stop()?;

    Ok(())
}
