use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bat_scene::camera::CameraUpdate;
use bat_scene::vertices::VertexSelection;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ServerOptions;
use crate::error::RemoteError;
use crate::executor::ExecutorHandle;
use crate::host::RemoteHost;
use crate::protocol::{
    FrameResponse, ObjectResponse, PoseCommand, RenderCommand, Status, StatusResponse,
    VerticesResponse,
};

/// Shared by all handlers of a server.
pub struct AppState<H> {
    /// Submits work to the main thread.
    pub executor: ExecutorHandle<H>,
    /// Server settings such as the request timeout.
    pub options: ServerOptions,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            options: self.options,
        }
    }
}

/// Build the router of the remote protocol.
///
/// # Arguments
///
/// * `executor` - Handle to the executor owning the application state.
/// * `options` - Server settings.
pub fn router<H: RemoteHost>(executor: ExecutorHandle<H>, options: ServerOptions) -> Router {
    Router::new()
        .route("/", post(handle_command::<H>))
        .route("/object", get(get_object::<H>))
        .route("/frame", get(get_frame::<H>))
        .route("/vertices", get(get_vertices::<H>))
        .fallback(unknown_query)
        .with_state(AppState { executor, options })
}

/// Handle `POST /`.
///
/// The keys `camera`, `pose`, `frame` and `render` are processed in that order,
/// each queuing its own task on the main thread. The response does not wait
/// for the tasks.
pub async fn handle_command<H: RemoteHost>(
    State(state): State<AppState<H>>,
    body: String,
) -> Json<StatusResponse> {
    Json(dispatch_command(&state.executor, &body))
}

fn dispatch_command<H: RemoteHost>(executor: &ExecutorHandle<H>, body: &str) -> StatusResponse {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) => return StatusResponse::failed(e.to_string()),
    };
    let Value::Object(fields) = value else {
        return StatusResponse::failed("The request body must be a JSON object.");
    };

    let mut message = String::new();
    let mut recognized = false;
    let mut queued = false;

    for key in ["camera", "pose", "frame", "render"] {
        let Some(value) = fields.get(key) else {
            continue;
        };
        recognized = true;
        match queue_command(executor, key, value) {
            Ok(done) => {
                queued = true;
                message.push_str(&done);
            }
            Err(fragment) => message.push_str(&fragment),
        }
    }

    if !recognized {
        return StatusResponse::failed(format!(
            "The request doesn't contain any valid keys. Received keys: {:?}",
            fields.keys().collect::<Vec<_>>()
        ));
    }

    if queued {
        StatusResponse::success(message)
    } else {
        StatusResponse::failed(message)
    }
}

// the message fragment of one key, Err if nothing was queued
fn queue_command<H: RemoteHost>(
    executor: &ExecutorHandle<H>,
    key: &str,
    value: &Value,
) -> Result<String, String> {
    let submit = |task: Box<dyn FnOnce(&mut H) + Send>, done: String| {
        executor
            .submit(task)
            .map(|_| done)
            .map_err(|e| format!("{e} ({key} was dropped), "))
    };

    match key {
        "camera" => {
            let update = parse::<CameraUpdate>(value, "camera parameters")?;
            submit(
                Box::new(move |host: &mut H| {
                    if let Err(e) = host.update_camera(&update) {
                        log::error!("could not update the camera: {e}");
                    }
                }),
                "Updated camera parameters, ".to_string(),
            )
        }
        "pose" => {
            let pose = parse::<PoseCommand>(value, "pose")?;
            let done = format!("Updated pose of {}, ", pose.name);
            submit(
                Box::new(move |host: &mut H| {
                    if let Err(e) = host.set_object_pose(&pose.name, pose.location, pose.rotation) {
                        log::error!("could not update the pose: {e}");
                    }
                }),
                done,
            )
        }
        "frame" => {
            let frame = value
                .as_i64()
                .ok_or_else(|| format!("Invalid frame {value}, expected an integer, "))?;
            submit(
                Box::new(move |host: &mut H| host.set_frame(frame)),
                format!("Set frame to {frame}, "),
            )
        }
        "render" => {
            let command = parse::<RenderCommand>(value, "render")?;
            if !command.render && !command.annotation && !command.depth {
                return Err("The render command does not request any pass, ".to_string());
            }

            let mut done = String::new();
            if command.render {
                done = submit(
                    Box::new(|host: &mut H| {
                        if let Err(e) = host.render() {
                            log::error!("could not render the frame: {e}");
                        }
                    }),
                    "Queued render of the current frame, ".to_string(),
                )?;
            }
            if command.annotation {
                done += &submit(
                    Box::new(|host: &mut H| {
                        if let Err(e) = host.render_annotation() {
                            log::error!("could not render the annotation: {e}");
                        }
                    }),
                    "Queued annotation render of the current frame, ".to_string(),
                )?;
            }
            if command.depth {
                done += &submit(
                    Box::new(|host: &mut H| {
                        if let Err(e) = host.render_depth() {
                            log::error!("could not render the depth map: {e}");
                        }
                    }),
                    "Queued depth render of the current frame, ".to_string(),
                )?;
            }
            Ok(done)
        }
        _ => Err(format!("Unknown key '{key}', ")),
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: &Value, what: &str) -> Result<T, String> {
    T::deserialize(value).map_err(|e| format!("Invalid {what}: {e}, "))
}

/// Handle `GET /object?name=<name>`.
pub async fn get_object<H: RemoteHost>(
    State(state): State<AppState<H>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(name) = params.get("name").cloned() else {
        return missing_parameter("name");
    };

    let result = run_on_main_thread(&state, {
        let name = name.clone();
        move |host: &mut H| host.object_pose(&name)
    })
    .await;

    match result {
        Ok(Ok((location, rotation))) => Json(ObjectResponse {
            status: Status::Success,
            object: name,
            location,
            rotation,
        })
        .into_response(),
        Ok(Err(e)) => Json(StatusResponse::failed(e.to_string())).into_response(),
        Err(e) => main_thread_error(e),
    }
}

/// Handle `GET /frame`.
pub async fn get_frame<H: RemoteHost>(State(state): State<AppState<H>>) -> Response {
    match run_on_main_thread(&state, |host: &mut H| host.frame()).await {
        Ok(frame) => Json(FrameResponse {
            status: Status::Success,
            frame,
        })
        .into_response(),
        Err(e) => main_thread_error(e),
    }
}

/// Handle `GET /vertices?name=<name>&vertex_indices=<all|i,j,...>`.
pub async fn get_vertices<H: RemoteHost>(
    State(state): State<AppState<H>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(name) = params.get("name").cloned() else {
        return missing_parameter("name");
    };
    let selection = match params
        .get("vertex_indices")
        .map_or(Ok(VertexSelection::All), |s| s.parse::<VertexSelection>())
    {
        Ok(selection) => selection,
        Err(e) => return Json(StatusResponse::failed(e.to_string())).into_response(),
    };

    let result = run_on_main_thread(&state, {
        let name = name.clone();
        move |host: &mut H| host.project_vertices(&name, &selection)
    })
    .await;

    match result {
        Ok(Ok(projection)) => Json(VerticesResponse::new(name, projection)).into_response(),
        Ok(Err(e)) => Json(StatusResponse::failed(e.to_string())).into_response(),
        Err(e) => main_thread_error(e),
    }
}

/// Answer requests for paths the protocol does not know.
pub async fn unknown_query(uri: Uri) -> Json<StatusResponse> {
    let query = uri.path().trim_start_matches('/');
    Json(StatusResponse::failed(format!("Unknown query '{query}'.")))
}

// queue a task and wait for its result, bounded by the request timeout
async fn run_on_main_thread<H: RemoteHost, R: Send + 'static>(
    state: &AppState<H>,
    task: impl FnOnce(&mut H) -> R + Send + 'static,
) -> Result<R, RemoteError> {
    let rx = state.executor.request(task)?;
    match tokio::time::timeout(state.options.request_timeout, rx).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(_)) => Err(RemoteError::TaskDropped),
        Err(_) => Err(RemoteError::Timeout),
    }
}

fn missing_parameter(name: &str) -> Response {
    Json(StatusResponse::failed(format!(
        "Missing required parameter '{name}'."
    )))
    .into_response()
}

fn main_thread_error(e: RemoteError) -> Response {
    log::error!("query failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusResponse::failed(e.to_string())),
    )
        .into_response()
}
